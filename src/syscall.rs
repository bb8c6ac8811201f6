use axerrno::{LinuxError, LinuxResult};
use rmk_api::imp::task::*;
use rmk_api::interface::task::*;
use rmk_api::interface::user::*;
use rmk_core::Kernel;
use syscalls::Sysno;

/// Registers saved on syscall entry. `ax` holds the syscall number on entry
/// and the result on return; arguments come in `bx`, `cx`, `dx`, `di`, `si`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrapFrame {
    pub ax: usize,
    pub bx: usize,
    pub cx: usize,
    pub dx: usize,
    pub di: usize,
    pub si: usize,
}

impl TrapFrame {
    pub fn new(syscall_num: usize, args: &[usize]) -> Self {
        let arg = |i: usize| args.get(i).copied().unwrap_or(0);
        Self {
            ax: syscall_num,
            bx: arg(0),
            cx: arg(1),
            dx: arg(2),
            di: arg(3),
            si: arg(4),
        }
    }

    pub fn arg0(&self) -> usize {
        self.bx
    }

    pub fn arg1(&self) -> usize {
        self.cx
    }

    pub fn arg2(&self) -> usize {
        self.dx
    }

    pub fn arg3(&self) -> usize {
        self.di
    }

    pub fn arg4(&self) -> usize {
        self.si
    }
}

/// Run the syscall described by `tf` for the current process and store the
/// result, or the negated errno, back into `ax`.
pub fn handle_syscall(kernel: &Kernel, tf: &mut TrapFrame) -> isize {
    let syscall_num = tf.ax;
    let Some(sysno) = Sysno::new(syscall_num) else {
        warn!("[syscall] unknown syscall number {}, ENOSYS", syscall_num);
        return finish(tf, Err(LinuxError::ENOSYS));
    };
    info!("[syscall] <{:?}> begin", sysno);
    let result: LinuxResult<isize> = match sysno {
        Sysno::exit => sys_exit(kernel, tf.arg0() as _),
        Sysno::exit_group => sys_exit_group(kernel, tf.arg0() as _),
        Sysno::kill => sys_kill(kernel, tf.arg0() as _, tf.arg1() as _),
        Sysno::wait4 => user_slot(tf.arg1())
            .and_then(|status| sys_wait4(kernel, tf.arg0() as _, status, tf.arg2() as _)),
        Sysno::clone => sys_clone(kernel, tf.arg0() as _),
        #[cfg(target_arch = "x86_64")]
        Sysno::fork => sys_fork(kernel),
        Sysno::getpid => sys_getpid(kernel),
        Sysno::getppid => sys_getppid(kernel),
        Sysno::getpgid => sys_getpgid(kernel, tf.arg0() as _),
        #[cfg(target_arch = "x86_64")]
        Sysno::getpgrp => sys_getpgid(kernel, 0),
        Sysno::getsid => sys_getsid(kernel, tf.arg0() as _),
        Sysno::setpgid => sys_setpgid(kernel, tf.arg0() as _, tf.arg1() as _),
        Sysno::setsid => sys_setsid(kernel),
        Sysno::getuid => sys_getuid(kernel),
        Sysno::geteuid => sys_geteuid(kernel),
        Sysno::getgid => sys_getgid(kernel),
        Sysno::getegid => sys_getegid(kernel),
        _ => stub_unimplemented(sysno),
    };
    let ans = finish(tf, result);
    info!("[syscall] <{:?}> return {}", sysno, ans);
    ans
}

fn finish(tf: &mut TrapFrame, result: LinuxResult<isize>) -> isize {
    let ans = result.unwrap_or_else(|err| -err.code() as isize);
    tf.ax = ans as usize;
    ans
}

/// Turn an optional user out-pointer into a writable slot. Null means the
/// caller does not want the value.
fn user_slot<'a>(addr: usize) -> LinuxResult<Option<&'a mut i32>> {
    if addr == 0 {
        return Ok(None);
    }
    if addr % core::mem::align_of::<i32>() != 0 {
        warn!("[syscall] misaligned user pointer {:#x}", addr);
        return Err(LinuxError::EFAULT);
    }
    // SAFETY: a non-null, aligned pointer refers to a live `i32` slot of the
    // calling process.
    Ok(unsafe { (addr as *mut i32).as_mut() })
}

fn stub_unimplemented(sysno: Sysno) -> LinuxResult<isize> {
    warn!("Unimplemented syscall: {:?}, ENOSYS", sysno);
    Err(LinuxError::ENOSYS)
}
