use axerrno::{LinuxError, LinuxResult};
use rmk_core::Kernel;
use rmk_core::error::{KernelError, KernelResult};
use rmk_process::{DevT, Pid, TableError};
use syscall_trace::syscall_trace;

/// Resolve a pid argument where 0 stands for the caller.
fn target_pid(kernel: &Kernel, pid: i32) -> LinuxResult<Pid> {
    match pid {
        0 => Ok(kernel.current_pid()),
        1.. => Ok(pid as Pid),
        _ => Err(LinuxError::EINVAL),
    }
}

#[syscall_trace]
pub fn sys_getpid(kernel: &Kernel) -> LinuxResult<isize> {
    Ok(kernel.current_pid() as _)
}

#[syscall_trace]
pub fn sys_getppid(kernel: &Kernel) -> LinuxResult<isize> {
    kernel
        .table()
        .get(kernel.current_pid())
        .map(|p| p.get_ppid() as _)
        .ok_or(LinuxError::ESRCH)
}

#[syscall_trace]
pub fn sys_getpgid(kernel: &Kernel, pid: i32) -> LinuxResult<isize> {
    let pid = target_pid(kernel, pid)?;
    kernel
        .table()
        .get(pid)
        .map(|p| p.get_pgid() as _)
        .ok_or(LinuxError::ESRCH)
}

#[syscall_trace]
pub fn sys_getsid(kernel: &Kernel, pid: i32) -> LinuxResult<isize> {
    let pid = target_pid(kernel, pid)?;
    kernel
        .table()
        .get(pid)
        .map(|p| p.get_sid() as _)
        .ok_or(LinuxError::ESRCH)
}

/// Move the caller or one of its children into group `pgid`, creating the
/// group when `pgid` equals the target's pid.
#[syscall_trace]
pub fn sys_setpgid(kernel: &Kernel, pid: i32, pgid: i32) -> LinuxResult<isize> {
    let current = kernel.current_pid();
    let pid = target_pid(kernel, pid)?;
    let pgid = match pgid {
        0 => pid,
        1.. => pgid as Pid,
        _ => return Err(LinuxError::EINVAL),
    };

    let mut table = kernel.table();
    let caller_sid = table
        .get(current)
        .map(|p| p.get_sid())
        .ok_or(LinuxError::ESRCH)?;
    let target = table.get(pid).ok_or(LinuxError::ESRCH)?;
    if pid != current && target.get_ppid() != current {
        return Err(LinuxError::ESRCH);
    }
    if target.get_sid() != caller_sid {
        return Err(LinuxError::EPERM);
    }
    match table.move_to_group(pid, pgid) {
        Ok(()) => {
            debug!("[setpgid] process {} joined group {}", pid, pgid);
            Ok(0)
        }
        Err(TableError::NoSuchGroup(_)) => Err(LinuxError::EPERM),
        Err(err) => Err(KernelError::from(err).into()),
    }
}

/// Start a new session, with the caller as leader of it and of its only group.
#[syscall_trace]
pub fn sys_setsid(kernel: &Kernel) -> LinuxResult<isize> {
    let current = kernel.current_pid();
    let sid = kernel
        .table()
        .create_session(current)
        .map_err(|_| LinuxError::EPERM)?;
    info!("[session] process {} started session {}", current, sid);
    Ok(sid as _)
}

/// Attach terminal `tty` to the caller's session. Only the session leader may
/// do this, and only while the session has no terminal.
pub fn set_controlling_tty(kernel: &Kernel, tty: DevT) -> KernelResult {
    let current = kernel.current_pid();
    kernel
        .table()
        .set_controlling_tty(current, tty)
        .map_err(|err| match err {
            TableError::NotSessionLeader(_) | TableError::Exists(_) => {
                KernelError::PermissionDenied
            }
            err => err.into(),
        })?;
    info!("[session] tty {:#06x} controls session {}", tty, current);
    Ok(())
}

/// Make `pgid` the foreground group on the caller's terminal.
pub fn set_foreground_group(kernel: &Kernel, pgid: Pid) -> KernelResult {
    let current = kernel.current_pid();
    kernel
        .table()
        .set_foreground(current, pgid)
        .map_err(|err| match err {
            TableError::NoSuchGroup(_) => KernelError::PermissionDenied,
            err => err.into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmk_process::{Credentials, INIT_PID};

    const TTY1: DevT = 0x0401;

    /// init -> shell(10, session leader) -> job(11) -> worker(12)
    fn shell() -> Kernel {
        let (_, kernel) = rmk_hal_mock::boot();
        {
            let mut table = kernel.table();
            table.spawn_with_pid(10, INIT_PID, Credentials::root()).unwrap();
            table.fork_with_pid(10, 11).unwrap();
            table.fork_with_pid(11, 12).unwrap();
        }
        kernel.set_current(10);
        kernel
    }

    #[test]
    fn ids_of_caller_and_others() {
        let kernel = shell();
        kernel.set_current(11);
        assert_eq!(sys_getpid(&kernel), Ok(11));
        assert_eq!(sys_getppid(&kernel), Ok(10));
        assert_eq!(sys_getpgid(&kernel, 0), Ok(10));
        assert_eq!(sys_getsid(&kernel, 12), Ok(10));
        assert_eq!(sys_getpgid(&kernel, 55), Err(LinuxError::ESRCH));
        assert_eq!(sys_getsid(&kernel, -3), Err(LinuxError::EINVAL));
    }

    #[test]
    fn shell_builds_a_job() {
        let kernel = shell();
        assert_eq!(sys_setpgid(&kernel, 11, 0), Ok(0));
        assert_eq!(sys_getpgid(&kernel, 11), Ok(11));
        // 12 is a grandchild of the shell
        assert_eq!(sys_setpgid(&kernel, 12, 11), Err(LinuxError::ESRCH));
        kernel.set_current(11);
        assert_eq!(sys_setpgid(&kernel, 12, 11), Ok(0));
        assert_eq!(sys_getpgid(&kernel, 12), Ok(11));
        assert_eq!(sys_setpgid(&kernel, 12, 77), Err(LinuxError::EPERM));
    }

    #[test]
    fn session_leader_stays_put() {
        let kernel = shell();
        assert_eq!(sys_setpgid(&kernel, 0, 0), Ok(0));
        assert!(sys_setpgid(&kernel, 10, 1).is_err());
        assert_eq!(sys_setsid(&kernel), Err(LinuxError::EPERM));
    }

    #[test]
    fn setsid_detaches_from_terminal() {
        let kernel = shell();
        set_controlling_tty(&kernel, TTY1).unwrap();
        kernel.set_current(12);
        assert_eq!(sys_setsid(&kernel), Ok(12));
        let table = kernel.table();
        let worker = table.get(12).unwrap();
        assert_eq!((worker.get_sid(), worker.get_pgid()), (12, 12));
        assert_eq!(worker.get_tty(), None);
        assert_eq!(table.get(11).unwrap().get_tty(), Some(TTY1));
    }

    #[test]
    fn terminal_control() {
        let kernel = shell();
        kernel.set_current(11);
        assert_eq!(
            set_controlling_tty(&kernel, TTY1),
            Err(KernelError::PermissionDenied)
        );
        kernel.set_current(10);
        assert_eq!(set_controlling_tty(&kernel, TTY1), Ok(()));
        assert_eq!(
            set_controlling_tty(&kernel, TTY1),
            Err(KernelError::PermissionDenied)
        );

        assert_eq!(sys_setpgid(&kernel, 11, 11), Ok(0));
        assert_eq!(set_foreground_group(&kernel, 11), Ok(()));
        assert_eq!(
            kernel.table().get_session(10).unwrap().get_foreground(),
            Some(11)
        );
        assert_eq!(
            set_foreground_group(&kernel, INIT_PID),
            Err(KernelError::PermissionDenied)
        );
    }
}
