use crate::imp::task::terminate_current;
use axerrno::LinuxResult;
use core::ffi::c_int;
use rmk_core::Kernel;
use syscall_trace::syscall_trace;

#[syscall_trace]
pub fn sys_exit(kernel: &Kernel, status: c_int) -> LinuxResult<isize> {
    terminate_current(kernel, status)
}

/// Processes are single-threaded, so the whole group is the caller alone.
#[syscall_trace]
pub fn sys_exit_group(kernel: &Kernel, status: c_int) -> LinuxResult<isize> {
    terminate_current(kernel, status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmk_process::INIT_PID;

    #[test]
    #[should_panic(expected = "mock hal: scheduled away from 2")]
    fn exit_never_returns() {
        let (_, kernel) = rmk_hal_mock::boot();
        let child = kernel.table().fork(INIT_PID).unwrap();
        kernel.set_current(child);
        let _ = sys_exit(&kernel, 0);
    }
}
