use crate::cred::Credentials;
use crate::signal::{SignalSet, Signo};
use crate::{DevT, Pid};

/// Lifecycle state of a process.
///
/// A process that has been collected by its parent has no state at all: its
/// entry is gone from the process table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Runnable,
    /// Sleeping in the kernel. Only interruptible sleepers are woken by signals.
    Blocked { interruptible: bool },
    Stopped,
    Zombie,
}

/// What a signal delivery did to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The target is a zombie; nothing changed.
    Dropped,
    /// The signal is pending; the target state is unchanged.
    Queued,
    /// The signal is pending and the target became runnable.
    Woken,
}

/// A job-control transition the parent has not been told about yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobChange {
    Stopped(Signo),
    Continued,
}

#[derive(Debug, Clone)]
pub struct Process {
    pid: Pid,
    ppid: Pid,
    pgid: Pid,
    sid: Pid,
    cred: Credentials,
    state: ProcessState,
    exit_code: i32,
    pending: SignalSet,
    tty: Option<DevT>,
    job_change: Option<JobChange>,
}

impl Process {
    pub(crate) fn new(pid: Pid, ppid: Pid, pgid: Pid, sid: Pid, cred: Credentials) -> Self {
        Self {
            pid,
            ppid,
            pgid,
            sid,
            cred,
            state: ProcessState::Runnable,
            exit_code: 0,
            pending: SignalSet::empty(),
            tty: None,
            job_change: None,
        }
    }

    /// Duplicate `self` into a new child entry with id `pid`.
    pub(crate) fn fork(&self, pid: Pid) -> Self {
        let mut child = Self::new(pid, self.pid, self.pgid, self.sid, self.cred.clone());
        child.tty = self.tty;
        child
    }

    pub fn get_pid(&self) -> Pid {
        self.pid
    }

    pub fn get_ppid(&self) -> Pid {
        self.ppid
    }

    pub fn get_pgid(&self) -> Pid {
        self.pgid
    }

    pub fn get_sid(&self) -> Pid {
        self.sid
    }

    pub fn get_cred(&self) -> &Credentials {
        &self.cred
    }

    pub fn get_state(&self) -> ProcessState {
        self.state
    }

    pub fn get_tty(&self) -> Option<DevT> {
        self.tty
    }

    pub fn pending(&self) -> SignalSet {
        self.pending
    }

    pub fn is_group_leader(&self) -> bool {
        self.pgid == self.pid
    }

    pub fn is_session_leader(&self) -> bool {
        self.sid == self.pid
    }

    pub fn is_zombie(&self) -> bool {
        self.state == ProcessState::Zombie
    }

    pub fn is_stopped(&self) -> bool {
        self.state == ProcessState::Stopped
    }

    pub fn get_exit_code(&self) -> i32 {
        assert!(self.is_zombie(), "[process] process {} is not exited", self.pid);
        self.exit_code
    }

    pub(crate) fn set_ppid(&mut self, ppid: Pid) {
        self.ppid = ppid;
    }

    pub(crate) fn set_pgid(&mut self, pgid: Pid) {
        self.pgid = pgid;
    }

    pub(crate) fn set_sid(&mut self, sid: Pid) {
        self.sid = sid;
    }

    pub(crate) fn set_tty(&mut self, tty: Option<DevT>) {
        self.tty = tty;
    }

    /// Put the process to sleep. Zombies stay zombies.
    pub fn block(&mut self, interruptible: bool) {
        if !self.is_zombie() {
            self.state = ProcessState::Blocked { interruptible };
        }
    }

    /// Move a sleeping process back to runnable. Returns whether it was asleep.
    pub fn unblock(&mut self) -> bool {
        if matches!(self.state, ProcessState::Blocked { .. }) {
            self.state = ProcessState::Runnable;
            true
        } else {
            false
        }
    }

    pub(crate) fn set_zombie(&mut self, exit_code: i32) {
        assert!(
            !self.is_zombie(),
            "[process] process {} is already exited",
            self.pid
        );
        self.exit_code = exit_code;
        self.state = ProcessState::Zombie;
        self.pending = SignalSet::empty();
        self.tty = None;
        self.job_change = None;
    }

    /// The last stop or continue that `wait` has not reported.
    pub fn job_change(&self) -> Option<JobChange> {
        self.job_change
    }

    pub fn take_job_change(&mut self) -> Option<JobChange> {
        self.job_change.take()
    }

    /// Post `sig` to this process and apply its immediate state effects.
    ///
    /// Continue resumes a stopped process and discards pending stops; a stop
    /// request discards a pending continue; `SIGSTOP` stops at once. Kill wakes
    /// any sleeper, other signals only wake interruptible ones.
    pub fn deliver(&mut self, sig: Signo) -> Delivery {
        if self.is_zombie() {
            return Delivery::Dropped;
        }
        if sig == Signo::SIGCONT {
            self.pending.clear_stops();
        } else if sig.is_stop() {
            self.pending.remove(Signo::SIGCONT);
        }
        self.pending.add(sig);

        let wake = match (sig, self.state) {
            (Signo::SIGCONT, ProcessState::Stopped) => {
                self.job_change = Some(JobChange::Continued);
                true
            }
            (Signo::SIGKILL, ProcessState::Stopped | ProcessState::Blocked { .. }) => true,
            (Signo::SIGSTOP, ProcessState::Stopped) => false,
            (Signo::SIGSTOP, _) => {
                self.state = ProcessState::Stopped;
                self.job_change = Some(JobChange::Stopped(sig));
                false
            }
            (_, ProcessState::Blocked { interruptible }) => interruptible,
            _ => false,
        };
        if wake {
            self.state = ProcessState::Runnable;
            Delivery::Woken
        } else {
            Delivery::Queued
        }
    }

    /// Take the lowest-numbered pending signal.
    pub fn take_pending(&mut self) -> Option<Signo> {
        let sig = self.pending.iter().next()?;
        self.pending.remove(sig);
        Some(sig)
    }
}
