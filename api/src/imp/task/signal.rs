use alloc::vec::Vec;
use axerrno::{LinuxError, LinuxResult};
use rmk_core::Kernel;
use rmk_core::error::{KernelError, KernelResult};
use rmk_process::{Credentials, Delivery, HangUp, INIT_PID, Pid, ProcessTable, Signo};
use syscall_trace::syscall_trace;

/// Who a delivery comes from. The kernel itself is never refused.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Sender<'a> {
    Kernel,
    Process(&'a Credentials),
}

impl Sender<'_> {
    fn may_signal(&self, target: &Credentials) -> bool {
        match self {
            Sender::Kernel => true,
            Sender::Process(cred) => cred.can_signal(target),
        }
    }
}

/// Deliver `sig` (or only probe, when `None`) to the live members of group
/// `pgid`, lowest pid first.
///
/// Returns the number of processes signaled. A group that only has zombies
/// left still exists and yields 0.
pub(crate) fn signal_group_locked(
    kernel: &Kernel,
    table: &mut ProcessTable,
    sender: Sender,
    pgid: Pid,
    sig: Option<Signo>,
    exclude_leader: bool,
) -> KernelResult<usize> {
    let group = table
        .get_process_group(pgid)
        .ok_or(KernelError::NoSuchGroup)?;
    let mut count = 0;
    let mut denied = 0;
    for &pid in group.get_processes() {
        if exclude_leader && pid == pgid {
            continue;
        }
        let Some(target) = table.get(pid) else {
            continue;
        };
        if target.is_zombie() {
            continue;
        }
        if !sender.may_signal(target.get_cred()) {
            denied += 1;
            continue;
        }
        match sig {
            Some(sig) => {
                if kernel.deliver_locked(table, pid, sig) != Delivery::Dropped {
                    count += 1;
                }
            }
            None => count += 1,
        }
    }
    if count == 0 && denied > 0 {
        return Err(KernelError::PermissionDenied);
    }
    Ok(count)
}

/// Send `sig` to every process of group `pgid` on behalf of the calling
/// process. With `exclude_leader`, the process whose pid is `pgid` is skipped.
///
/// Returns how many processes received the signal.
pub fn signal_group(
    kernel: &Kernel,
    pgid: Pid,
    sig: Signo,
    exclude_leader: bool,
) -> KernelResult<usize> {
    info!("Send signal {} to process group {}", sig, pgid);
    let mut table = kernel.table();
    let cred = sender_cred(kernel, &table)?;
    signal_group_locked(
        kernel,
        &mut table,
        Sender::Process(&cred),
        pgid,
        Some(sig),
        exclude_leader,
    )
}

/// Send `sig` to a single process on behalf of the calling process.
pub fn send_signal_process(kernel: &Kernel, pid: Pid, sig: Option<Signo>) -> KernelResult<()> {
    let mut table = kernel.table();
    let cred = sender_cred(kernel, &table)?;
    let target = table.get(pid).ok_or(KernelError::NoSuchProcess)?;
    if !cred.can_signal(target.get_cred()) {
        return Err(KernelError::PermissionDenied);
    }
    if let Some(sig) = sig {
        info!("Send signal {} to process {}", sig, pid);
        kernel.deliver_locked(&mut table, pid, sig);
    }
    Ok(())
}

fn sender_cred(kernel: &Kernel, table: &ProcessTable) -> KernelResult<Credentials> {
    table
        .get(kernel.current_pid())
        .map(|p| p.get_cred().clone())
        .ok_or(KernelError::NoSuchProcess)
}

/// Hang up session `sid`, whose terminal is going away because of `caller`.
///
/// The leader gets `SIGHUP` unless it is the caller; the foreground group
/// gets `SIGHUP` followed by `SIGCONT` so stopped members see the hangup.
pub(crate) fn hang_up_locked(
    kernel: &Kernel,
    table: &mut ProcessTable,
    sid: Pid,
    caller: Pid,
) -> KernelResult<()> {
    let (tty, foreground) = match table.hang_up_session(sid) {
        Ok(HangUp::Detached { tty, foreground }) => (tty, foreground),
        Ok(HangUp::AlreadyHungUp) => {
            debug!("[session] session {} already hung up", sid);
            return Ok(());
        }
        Ok(HangUp::NoTerminal) | Err(_) => return Err(KernelError::NotController),
    };
    info!("[session] hangup of session {} on tty {:#06x}", sid, tty);
    if caller != sid {
        kernel.deliver_locked(table, sid, Signo::SIGHUP);
    }
    if let Some(pgid) = foreground {
        for sig in [Signo::SIGHUP, Signo::SIGCONT] {
            // the foreground group may already be gone
            let _ = signal_group_locked(kernel, table, Sender::Kernel, pgid, Some(sig), false);
        }
    }
    Ok(())
}

/// Hang up the calling process's session on behalf of a member that is not
/// its leader. A call from the leader itself changes nothing.
///
/// Fails with `NotController` when the caller's session has no controlling
/// terminal. A session already hung up is left alone.
pub fn signal_session_leader(kernel: &Kernel) -> KernelResult<()> {
    let caller = kernel.current_pid();
    let mut table = kernel.table();
    let sid = table
        .get(caller)
        .map(|p| p.get_sid())
        .ok_or(KernelError::NoSuchProcess)?;
    let session = table.get_session(sid).ok_or(KernelError::NotController)?;
    if session.get_tty().is_none() && !session.is_hung_up() {
        return Err(KernelError::NotController);
    }
    if caller == sid {
        debug!("[session] leader {} asked to hang itself up, ignored", sid);
        return Ok(());
    }
    hang_up_locked(kernel, &mut table, sid, caller)
}

fn make_signal(signo: u32) -> LinuxResult<Option<Signo>> {
    if signo == 0 {
        return Ok(None);
    }
    Signo::from_repr(signo)
        .map(Some)
        .ok_or(KernelError::InvalidSignal.into())
}

#[syscall_trace]
pub fn sys_kill(kernel: &Kernel, pid: i32, signo: u32) -> LinuxResult<isize> {
    let sig = make_signal(signo)?;

    let result = match pid {
        1.. => {
            send_signal_process(kernel, pid as Pid, sig)?;
            1
        }
        0 => {
            let mut table = kernel.table();
            let cred = sender_cred(kernel, &table)?;
            let pgid = table
                .get(kernel.current_pid())
                .map(|p| p.get_pgid())
                .ok_or(LinuxError::ESRCH)?;
            signal_group_locked(kernel, &mut table, Sender::Process(&cred), pgid, sig, false)?
        }
        -1 => {
            let caller = kernel.current_pid();
            let mut table = kernel.table();
            let cred = sender_cred(kernel, &table)?;
            let targets: Vec<Pid> = table
                .iter()
                .filter(|p| p.get_pid() != INIT_PID && p.get_pid() != caller && !p.is_zombie())
                .filter(|p| cred.can_signal(p.get_cred()))
                .map(|p| p.get_pid())
                .collect();
            if let Some(sig) = sig {
                for &target in &targets {
                    kernel.deliver_locked(&mut table, target, sig);
                }
            }
            targets.len()
        }
        ..-1 => {
            let mut table = kernel.table();
            let cred = sender_cred(kernel, &table)?;
            let pgid = pid.unsigned_abs() as Pid;
            signal_group_locked(kernel, &mut table, Sender::Process(&cred), pgid, sig, false)?
        }
    };

    debug!("[sys_kill] successfully sent signal to {} processes", result);

    if result > 0 {
        Ok(0)
    } else {
        Err(LinuxError::ESRCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmk_process::ProcessState;

    /// A(10, uid 0) leads a session with B(11, group 10) and C(12, group 12).
    fn scenario() -> (alloc::sync::Arc<rmk_hal_mock::MockHal>, Kernel) {
        let (hal, kernel) = rmk_hal_mock::boot();
        {
            let mut table = kernel.table();
            table.spawn_with_pid(10, INIT_PID, Credentials::root()).unwrap();
            table.fork_with_pid(10, 11).unwrap();
            table.fork_with_pid(10, 12).unwrap();
            table.create_group(12).unwrap();
        }
        kernel.set_current(10);
        (hal, kernel)
    }

    fn pending(kernel: &Kernel, pid: Pid, sig: Signo) -> bool {
        kernel.table().get(pid).unwrap().pending().contains(sig)
    }

    #[test]
    fn group_signal_reaches_members_only() {
        let (_, kernel) = scenario();
        assert_eq!(signal_group(&kernel, 10, Signo::SIGHUP, false), Ok(2));
        assert!(pending(&kernel, 10, Signo::SIGHUP));
        assert!(pending(&kernel, 11, Signo::SIGHUP));
        assert!(!pending(&kernel, 12, Signo::SIGHUP));
        assert!(!pending(&kernel, INIT_PID, Signo::SIGHUP));
    }

    #[test]
    fn exclude_leader_skips_group_leader() {
        let (_, kernel) = scenario();
        assert_eq!(signal_group(&kernel, 10, Signo::SIGUSR1, true), Ok(1));
        assert!(!pending(&kernel, 10, Signo::SIGUSR1));
        assert!(pending(&kernel, 11, Signo::SIGUSR1));
    }

    #[test]
    fn unknown_group_is_an_error() {
        let (_, kernel) = scenario();
        assert_eq!(
            signal_group(&kernel, 77, Signo::SIGTERM, false),
            Err(KernelError::NoSuchGroup)
        );
        assert!(kernel.table().iter().all(|p| p.pending().is_empty()));
    }

    #[test]
    fn zombie_only_group_yields_zero() {
        let (_, kernel) = scenario();
        kernel.table().mark_zombie(12, 0).unwrap();
        assert_eq!(signal_group(&kernel, 12, Signo::SIGTERM, false), Ok(0));
    }

    #[test]
    fn unprivileged_sender_is_refused() {
        let (_, kernel) = scenario();
        kernel
            .table()
            .spawn_with_pid(20, INIT_PID, Credentials::new(500, 500))
            .unwrap();
        kernel.set_current(20);
        assert_eq!(
            signal_group(&kernel, 10, Signo::SIGTERM, false),
            Err(KernelError::PermissionDenied)
        );
        assert_eq!(signal_group(&kernel, 20, Signo::SIGUSR2, false), Ok(1));
    }

    #[test]
    fn signal_wakes_interruptible_sleeper() {
        let (hal, kernel) = scenario();
        kernel.table().get_mut(11).unwrap().block(true);
        signal_group(&kernel, 10, Signo::SIGUSR1, false).unwrap();
        assert_eq!(
            kernel.table().get(11).unwrap().get_state(),
            ProcessState::Runnable
        );
        assert_eq!(hal.wake_count(11), 1);
    }

    #[test]
    fn session_hangup_needs_a_terminal() {
        let (_, kernel) = scenario();
        assert_eq!(
            signal_session_leader(&kernel),
            Err(KernelError::NotController)
        );
    }

    #[test]
    fn session_hangup_is_idempotent() {
        let (hal, kernel) = scenario();
        kernel.table().set_controlling_tty(10, 0x0401).unwrap();
        kernel.table().set_foreground(10, 12).unwrap();
        kernel.table().get_mut(12).unwrap().deliver(Signo::SIGSTOP);
        kernel.set_current(11);

        assert_eq!(signal_session_leader(&kernel), Ok(()));
        assert!(pending(&kernel, 10, Signo::SIGHUP));
        assert!(pending(&kernel, 12, Signo::SIGHUP));
        assert!(pending(&kernel, 12, Signo::SIGCONT));
        assert!(!pending(&kernel, 11, Signo::SIGHUP));
        // continued after the stop
        assert_eq!(
            kernel.table().get(12).unwrap().get_state(),
            ProcessState::Runnable
        );
        assert_eq!(hal.wake_count(12), 1);

        kernel.table().get_mut(10).unwrap().take_pending();
        assert_eq!(signal_session_leader(&kernel), Ok(()));
        assert!(!pending(&kernel, 10, Signo::SIGHUP));
        assert_eq!(hal.wake_count(12), 1);
    }

    #[test]
    fn leader_cannot_hang_up_itself() {
        let (hal, kernel) = scenario();
        kernel.table().set_controlling_tty(10, 0x0401).unwrap();
        kernel.table().set_foreground(10, 12).unwrap();

        assert_eq!(signal_session_leader(&kernel), Ok(()));
        let table = kernel.table();
        let session = table.get_session(10).unwrap();
        assert!(!session.is_hung_up());
        assert_eq!(session.get_tty(), Some(0x0401));
        assert!(table.iter().all(|p| p.pending().is_empty()));
        assert_eq!(table.get(12).unwrap().get_tty(), Some(0x0401));
        drop(table);
        assert_eq!(hal.wake_count(12), 0);
    }

    #[test]
    fn kill_encodings() {
        let (_, kernel) = scenario();
        assert_eq!(sys_kill(&kernel, 12, Signo::SIGUSR1 as u32), Ok(0));
        assert!(pending(&kernel, 12, Signo::SIGUSR1));

        assert_eq!(sys_kill(&kernel, 0, Signo::SIGUSR2 as u32), Ok(0));
        assert!(pending(&kernel, 11, Signo::SIGUSR2));
        assert!(!pending(&kernel, 12, Signo::SIGUSR2));

        assert_eq!(sys_kill(&kernel, -12, Signo::SIGTERM as u32), Ok(0));
        assert!(pending(&kernel, 12, Signo::SIGTERM));

        assert_eq!(sys_kill(&kernel, -1, Signo::SIGINT as u32), Ok(0));
        assert!(pending(&kernel, 11, Signo::SIGINT));
        assert!(!pending(&kernel, 10, Signo::SIGINT));
        assert!(!pending(&kernel, INIT_PID, Signo::SIGINT));

        assert_eq!(sys_kill(&kernel, -99, Signo::SIGTERM as u32), Err(LinuxError::ESRCH));
        assert_eq!(sys_kill(&kernel, 99, 0), Err(LinuxError::ESRCH));
        assert_eq!(sys_kill(&kernel, 11, 0), Ok(0));
        assert_eq!(sys_kill(&kernel, 11, 200), Err(LinuxError::EINVAL));
    }
}
