use axerrno::LinuxError;
use core::fmt;
use rmk_process::TableError;

/// Recoverable failures of the kernel core, handed back to the syscall layer.
///
/// Inconsistencies of the process table are not represented here: they go
/// to [`Kernel::fatal`](crate::Kernel::fatal) and halt the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// No process, live or zombie, carries the target process group id.
    NoSuchGroup,
    NoSuchProcess,
    /// The caller's session has no controlling terminal.
    NotController,
    PermissionDenied,
    /// The process table has no free slot.
    TableFull,
    /// No child matches a wait request.
    NoChild,
    InvalidSignal,
    InvalidArgument,
}

pub type KernelResult<T = ()> = Result<T, KernelError>;

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            KernelError::NoSuchGroup => "no such process group",
            KernelError::NoSuchProcess => "no such process",
            KernelError::NotController => "no controlling terminal",
            KernelError::PermissionDenied => "operation not permitted",
            KernelError::TableFull => "process table full",
            KernelError::NoChild => "no child processes",
            KernelError::InvalidSignal => "invalid signal",
            KernelError::InvalidArgument => "invalid argument",
        })
    }
}

impl From<TableError> for KernelError {
    fn from(err: TableError) -> Self {
        match err {
            TableError::Full => KernelError::TableFull,
            TableError::NoSuchProcess(_) => KernelError::NoSuchProcess,
            TableError::NoSuchGroup(_) => KernelError::NoSuchGroup,
            TableError::NoSuchSession(_) => KernelError::NotController,
            TableError::NotZombie(_) => KernelError::InvalidArgument,
            TableError::Exists(_)
            | TableError::SessionLeader(_)
            | TableError::GroupLeader(_)
            | TableError::NotSessionLeader(_) => KernelError::PermissionDenied,
        }
    }
}

impl From<KernelError> for LinuxError {
    fn from(err: KernelError) -> Self {
        match err {
            KernelError::NoSuchGroup | KernelError::NoSuchProcess => LinuxError::ESRCH,
            KernelError::NotController => LinuxError::ENOTTY,
            KernelError::PermissionDenied => LinuxError::EPERM,
            KernelError::TableFull => LinuxError::EAGAIN,
            KernelError::NoChild => LinuxError::ECHILD,
            KernelError::InvalidSignal | KernelError::InvalidArgument => LinuxError::EINVAL,
        }
    }
}
