use axerrno::LinuxResult;
use rmk_core::Kernel;
use syscall_trace::syscall_trace;

#[syscall_trace]
pub fn sys_getgid(kernel: &Kernel) -> LinuxResult<isize> {
    Ok(kernel.current_cred()?.gid as _)
}

#[syscall_trace]
pub fn sys_getegid(kernel: &Kernel) -> LinuxResult<isize> {
    Ok(kernel.current_cred()?.egid as _)
}

#[syscall_trace]
pub fn sys_getuid(kernel: &Kernel) -> LinuxResult<isize> {
    Ok(kernel.current_cred()?.uid as _)
}

#[syscall_trace]
pub fn sys_geteuid(kernel: &Kernel) -> LinuxResult<isize> {
    Ok(kernel.current_cred()?.euid as _)
}
