use alloc::vec::Vec;
use axerrno::{LinuxError, LinuxResult};
use bitflags::bitflags;
use linux_raw_sys::general::{WCONTINUED, WNOHANG, WNOWAIT, WUNTRACED};
use rmk_core::Kernel;
use rmk_process::{JobChange, Pid, Process};
use syscall_trace::syscall_trace;

bitflags! {
    #[derive(Debug)]
    struct WaitOptions: u32 {
        /// Do not block when there are no processes wishing to report status.
        const WNOHANG = WNOHANG;
        /// Report the status of selected processes which are stopped due to a
        /// `SIGTTIN`, `SIGTTOU`, `SIGTSTP`, or `SIGSTOP` signal.
        const WUNTRACED = WUNTRACED;
        /// Report the status of selected processes that have continued from a
        /// job control stop by receiving a `SIGCONT` signal.
        const WCONTINUED = WCONTINUED;
        /// Don't reap, just poll status.
        const WNOWAIT = WNOWAIT;
    }
}

#[derive(Debug, Clone, Copy)]
enum WaitPid {
    /// Wait for any child process
    Any,
    /// Wait for the child whose process ID is equal to the value.
    Pid(Pid),
    /// Wait for any child process whose process group ID is equal to the value.
    Pgid(Pid),
}

impl WaitPid {
    fn apply(&self, child: &Process) -> bool {
        match self {
            WaitPid::Any => true,
            WaitPid::Pid(pid) => child.get_pid() == *pid,
            WaitPid::Pgid(pgid) => child.get_pgid() == *pgid,
        }
    }
}

/// Status word of a stopped child: `0x7f` with the stop signal in bits 8..16.
fn stopped_status(sig: rmk_process::Signo) -> i32 {
    ((sig as i32) << 8) | 0x7f
}

const CONTINUED_STATUS: i32 = 0xffff;

/// Collect an exited child of the calling process.
///
/// Returns the child's pid and stores its status, exit code in bits 8..16,
/// into `exit_code`. Exited children come first. With `WUNTRACED` a child
/// that stopped, and with `WCONTINUED` one that was continued, is reported
/// once and stays in the table. With `WNOHANG` and nothing to report the
/// result is 0. Otherwise the caller is put to sleep until the next
/// `SIGCHLD` and `EAGAIN` tells the dispatcher to retry once it runs again.
#[syscall_trace]
pub fn sys_wait4(
    kernel: &Kernel,
    pid: i32,
    mut exit_code: Option<&mut i32>,
    options: u32,
) -> LinuxResult<isize> {
    let options = WaitOptions::from_bits(options).ok_or(LinuxError::EINVAL)?;
    let current = kernel.current_pid();
    let mut table = kernel.table();
    let process = table.get(current).ok_or(LinuxError::ESRCH)?;

    let pid = if pid == -1 {
        WaitPid::Any
    } else if pid == 0 {
        WaitPid::Pgid(process.get_pgid())
    } else if pid > 0 {
        WaitPid::Pid(pid as _)
    } else {
        WaitPid::Pgid(pid.unsigned_abs())
    };

    let children = table
        .get_children(current)
        .into_iter()
        .filter(|child| table.get(*child).is_some_and(|c| pid.apply(c)))
        .collect::<Vec<_>>();
    if children.is_empty() {
        return Err(LinuxError::ECHILD);
    }

    let zombie = children
        .iter()
        .copied()
        .find(|child| table.get(*child).is_some_and(Process::is_zombie));
    if let Some(child) = zombie {
        let status = if options.contains(WaitOptions::WNOWAIT) {
            table.get(child).map(Process::get_exit_code)
        } else {
            table.release(child).ok().map(|p| p.get_exit_code())
        };
        if let (Some(status), Some(exit_code)) = (status, exit_code.as_deref_mut()) {
            *exit_code = (status & 0xff) << 8;
        }
        return Ok(child as _);
    }

    let changed = children.iter().copied().find_map(|child| {
        match table.get(child)?.job_change()? {
            JobChange::Stopped(sig) if options.contains(WaitOptions::WUNTRACED) => {
                Some((child, stopped_status(sig)))
            }
            JobChange::Continued if options.contains(WaitOptions::WCONTINUED) => {
                Some((child, CONTINUED_STATUS))
            }
            _ => None,
        }
    });
    if let Some((child, status)) = changed {
        if !options.contains(WaitOptions::WNOWAIT) {
            if let Some(process) = table.get_mut(child) {
                process.take_job_change();
            }
        }
        if let Some(exit_code) = exit_code.as_deref_mut() {
            *exit_code = status;
        }
        return Ok(child as _);
    }
    if options.contains(WaitOptions::WNOHANG) {
        return Ok(0);
    }
    if let Some(process) = table.get_mut(current) {
        process.block(true);
    }
    Err(LinuxError::EAGAIN)
}
