use core::fmt;
use linux_raw_sys::general::{
    SIGABRT, SIGALRM, SIGBUS, SIGCHLD, SIGCONT, SIGFPE, SIGHUP, SIGILL, SIGINT, SIGIO, SIGKILL,
    SIGPIPE, SIGPROF, SIGPWR, SIGQUIT, SIGSEGV, SIGSTKFLT, SIGSTOP, SIGSYS, SIGTERM, SIGTRAP,
    SIGTSTP, SIGTTIN, SIGTTOU, SIGURG, SIGUSR1, SIGUSR2, SIGVTALRM, SIGWINCH, SIGXCPU, SIGXFSZ,
};

/// Standard signal numbers.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Signo {
    SIGHUP = SIGHUP as u8,
    SIGINT = SIGINT as u8,
    SIGQUIT = SIGQUIT as u8,
    SIGILL = SIGILL as u8,
    SIGTRAP = SIGTRAP as u8,
    SIGABRT = SIGABRT as u8,
    SIGBUS = SIGBUS as u8,
    SIGFPE = SIGFPE as u8,
    SIGKILL = SIGKILL as u8,
    SIGUSR1 = SIGUSR1 as u8,
    SIGSEGV = SIGSEGV as u8,
    SIGUSR2 = SIGUSR2 as u8,
    SIGPIPE = SIGPIPE as u8,
    SIGALRM = SIGALRM as u8,
    SIGTERM = SIGTERM as u8,
    SIGSTKFLT = SIGSTKFLT as u8,
    SIGCHLD = SIGCHLD as u8,
    SIGCONT = SIGCONT as u8,
    SIGSTOP = SIGSTOP as u8,
    SIGTSTP = SIGTSTP as u8,
    SIGTTIN = SIGTTIN as u8,
    SIGTTOU = SIGTTOU as u8,
    SIGURG = SIGURG as u8,
    SIGXCPU = SIGXCPU as u8,
    SIGXFSZ = SIGXFSZ as u8,
    SIGVTALRM = SIGVTALRM as u8,
    SIGPROF = SIGPROF as u8,
    SIGWINCH = SIGWINCH as u8,
    SIGIO = SIGIO as u8,
    SIGPWR = SIGPWR as u8,
    SIGSYS = SIGSYS as u8,
}

impl Signo {
    const ALL: [Signo; 31] = [
        Signo::SIGHUP,
        Signo::SIGINT,
        Signo::SIGQUIT,
        Signo::SIGILL,
        Signo::SIGTRAP,
        Signo::SIGABRT,
        Signo::SIGBUS,
        Signo::SIGFPE,
        Signo::SIGKILL,
        Signo::SIGUSR1,
        Signo::SIGSEGV,
        Signo::SIGUSR2,
        Signo::SIGPIPE,
        Signo::SIGALRM,
        Signo::SIGTERM,
        Signo::SIGSTKFLT,
        Signo::SIGCHLD,
        Signo::SIGCONT,
        Signo::SIGSTOP,
        Signo::SIGTSTP,
        Signo::SIGTTIN,
        Signo::SIGTTOU,
        Signo::SIGURG,
        Signo::SIGXCPU,
        Signo::SIGXFSZ,
        Signo::SIGVTALRM,
        Signo::SIGPROF,
        Signo::SIGWINCH,
        Signo::SIGIO,
        Signo::SIGPWR,
        Signo::SIGSYS,
    ];

    /// Convert a raw signal number. Returns `None` for 0 and out-of-range values.
    pub fn from_repr(signo: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|sig| *sig as u32 == signo)
    }

    /// Signals that stop the receiving process by default.
    pub fn is_stop(self) -> bool {
        matches!(
            self,
            Signo::SIGSTOP | Signo::SIGTSTP | Signo::SIGTTIN | Signo::SIGTTOU
        )
    }
}

impl fmt::Display for Signo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, *self as u8)
    }
}

/// A set of signals, one bit per signal number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalSet(u64);

impl SignalSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    fn bit(sig: Signo) -> u64 {
        1u64 << (sig as u8 - 1)
    }

    pub fn add(&mut self, sig: Signo) -> bool {
        let had = self.contains(sig);
        self.0 |= Self::bit(sig);
        !had
    }

    pub fn remove(&mut self, sig: Signo) -> bool {
        let had = self.contains(sig);
        self.0 &= !Self::bit(sig);
        had
    }

    pub fn contains(&self, sig: Signo) -> bool {
        self.0 & Self::bit(sig) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Drop every pending stop signal, as a continue does.
    pub fn clear_stops(&mut self) {
        for sig in [Signo::SIGSTOP, Signo::SIGTSTP, Signo::SIGTTIN, Signo::SIGTTOU] {
            self.remove(sig);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Signo> + '_ {
        Signo::ALL.iter().copied().filter(|sig| self.contains(*sig))
    }
}
