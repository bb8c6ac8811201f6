use axerrno::{LinuxError, LinuxResult};
use bitflags::bitflags;
use linux_raw_sys::general::*;
use rmk_core::Kernel;
use rmk_core::error::KernelError;
use rmk_process::Signo;
use syscall_trace::syscall_trace;

bitflags! {
    /// Options for use with [`sys_clone`].
    #[derive(Debug, Clone, Copy, Default)]
    pub struct CloneFlags: u32 {
        /// The calling process and the child process run in the same
        /// memory space.
        const VM = CLONE_VM;
        /// The caller and the child process share the same  filesystem
        /// information.
        const FS = CLONE_FS;
        /// The calling process and the child process share the same file
        /// descriptor table.
        const FILES = CLONE_FILES;
        /// The calling process and the child process share the same table
        /// of signal handlers.
        const SIGHAND = CLONE_SIGHAND;
        /// The execution of the calling process is suspended until the
        /// child releases its virtual memory resources via a call to
        /// execve(2) or _exit(2) (as with vfork(2)).
        const VFORK = CLONE_VFORK;
        /// The parent of the new child  (as returned by getppid(2))
        /// will be the same as that of the calling process.
        const PARENT = CLONE_PARENT;
        /// The child is placed in the same thread group as the calling
        /// process.
        const THREAD = CLONE_THREAD;
    }
}

/// Every process owns its memory, files and handlers; nothing can be shared.
const UNSUPPORTED: CloneFlags = CloneFlags::VM
    .union(CloneFlags::FS)
    .union(CloneFlags::FILES)
    .union(CloneFlags::SIGHAND)
    .union(CloneFlags::VFORK)
    .union(CloneFlags::THREAD);

pub fn sys_clone_impl(kernel: &Kernel, clone_flags: CloneFlags) -> LinuxResult<isize> {
    if clone_flags.intersects(UNSUPPORTED) {
        warn!("[clone] unsupported flags {:?}", clone_flags & UNSUPPORTED);
        return Err(LinuxError::EINVAL);
    }
    let current = kernel.current_pid();
    let mut table = kernel.table();
    let caller = table.get(current).ok_or(LinuxError::ESRCH)?;
    let parent = if clone_flags.contains(CloneFlags::PARENT) {
        let ppid = caller.get_ppid();
        // init has no parent to share
        if !table.contains(ppid) {
            return Err(LinuxError::EINVAL);
        }
        ppid
    } else {
        current
    };

    let child = table.fork(current).map_err(KernelError::from)?;
    if parent != current {
        table.set_parent(child, parent).map_err(KernelError::from)?;
    }
    drop(table);
    info!("[clone] process {} created child {}", current, child);
    kernel.hal().wake(child);
    Ok(child as _)
}

#[syscall_trace]
pub fn sys_clone(kernel: &Kernel, flags: u32) -> LinuxResult<isize> {
    // the low byte is the signal sent to the parent on exit
    let exit_signal = flags & 0xff;
    if exit_signal != 0 && exit_signal != Signo::SIGCHLD as u32 {
        return Err(LinuxError::EINVAL);
    }
    sys_clone_impl(kernel, CloneFlags::from_bits_truncate(flags & !0xff))
}

#[syscall_trace]
pub fn sys_fork(kernel: &Kernel) -> LinuxResult<isize> {
    sys_clone_impl(kernel, CloneFlags::empty())
}
