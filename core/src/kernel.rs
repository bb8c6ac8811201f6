use crate::config::BootParams;
use crate::cpu::{CpuInfo, CpuLevel};
use crate::diag::Diagnostics;
use crate::hal::Hal;
use alloc::sync::Arc;
use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};
use rmk_process::{INIT_PID, Pid, ProcessTable};
use spin::{Mutex, MutexGuard};

/// Where control goes when a routine gives up the CPU for good.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// `from` has exited; pick the next process to run.
    Reschedule { from: Pid },
    /// Stop the machine.
    Halt,
}

/// Process-wide kernel state, built once at boot and never torn down.
pub struct Kernel {
    cpu: CpuInfo,
    diag: Diagnostics,
    table: Mutex<ProcessTable>,
    current: AtomicU32,
    hal: Arc<dyn Hal>,
}

impl Kernel {
    pub fn new(params: &BootParams, level: CpuLevel, hal: Arc<dyn Hal>) -> Self {
        Self {
            cpu: CpuInfo::new(level, params.running_qemu, params.debug_level),
            diag: Diagnostics::new(params.log_capacity, params.debug_level, hal.clone()),
            table: Mutex::new(ProcessTable::new(params.max_tasks)),
            current: AtomicU32::new(INIT_PID),
            hal,
        }
    }

    pub fn cpu(&self) -> &CpuInfo {
        &self.cpu
    }

    pub fn diag(&self) -> &Diagnostics {
        &self.diag
    }

    pub fn hal(&self) -> &dyn Hal {
        self.hal.as_ref()
    }

    /// Lock the process table. Every mutation of the table happens under
    /// this lock and runs to completion before it is released.
    pub fn table(&self) -> MutexGuard<'_, ProcessTable> {
        self.table.lock()
    }

    pub fn current_pid(&self) -> Pid {
        self.current.load(Ordering::Acquire)
    }

    /// Record the process the scheduler just dispatched.
    pub fn set_current(&self, pid: Pid) {
        self.current.store(pid, Ordering::Release);
    }

    pub fn printk(&self, args: fmt::Arguments) {
        self.diag.printk(args);
    }

    /// Report an unrecoverable inconsistency and halt.
    pub fn fatal(&self, args: fmt::Arguments) -> ! {
        self.diag.printk(format_args!("panic: {}", args));
        self.halt()
    }

    pub fn halt(&self) -> ! {
        self.hal.halt()
    }

    /// Hand the CPU over as `transfer` says. Never comes back.
    pub fn transfer(&self, transfer: Transfer) -> ! {
        match transfer {
            Transfer::Reschedule { from } => self.hal.schedule_away(from),
            Transfer::Halt => self.halt(),
        }
    }
}
