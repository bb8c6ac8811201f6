//! Touchpoints the kernel core needs from the platform, the scheduler and
//! the memory/file layers.

use crate::cpu::CpuLevel;
use core::fmt;
use rmk_process::Pid;

/// A per-process resource that was already gone when the process exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingResource {
    pub what: &'static str,
}

impl fmt::Display for MissingResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing {}", self.what)
    }
}

pub trait Hal: Send + Sync {
    /// Probe the processor variant.
    fn cpu_level(&self) -> CpuLevel;

    /// Stop the processor for good.
    fn halt(&self) -> !;

    /// Raw console output, usable before any driver is up.
    fn early_putchar(&self, c: u8);

    fn wait_for_keypress(&self) -> u8;

    /// Mark `pid` ready to run.
    fn wake(&self, pid: Pid);

    /// Give up the CPU on behalf of `pid`, which never runs again, and
    /// dispatch the next process.
    fn schedule_away(&self, pid: Pid) -> !;

    /// Free memory, files and other per-process resources of `pid`.
    fn release_resources(&self, pid: Pid) -> Result<(), MissingResource>;
}
