//! Mock HAL implementation for testing rmk
//!
//! Records every scheduler, console and resource call so tests can check
//! what the kernel core asked of the platform. The diverging calls (`halt`,
//! `schedule_away`) panic with a recognizable message instead.

#![no_std]
extern crate alloc;

use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use rmk_core::config::BootParams;
use rmk_core::cpu::CpuLevel;
use rmk_core::hal::{Hal, MissingResource};
use rmk_core::Kernel;
use rmk_process::Pid;
use spin::Mutex;

/// Panic message of [`MockHal::halt`].
pub const HALTED: &str = "mock hal: halted";

/// Mock HAL for unit testing
pub struct MockHal {
    cpu: CpuLevel,
    /// Captured console output
    console: Mutex<String>,
    /// Pids handed to `wake`, in call order
    woken: Mutex<Vec<Pid>>,
    /// Pids whose resources were released
    released: Mutex<Vec<Pid>>,
    /// Pids whose resources are reported as already gone
    missing: Mutex<BTreeSet<Pid>>,
    keypresses: Mutex<usize>,
}

impl MockHal {
    pub fn new() -> Self {
        Self::with_cpu(CpuLevel::I8088)
    }

    pub fn with_cpu(cpu: CpuLevel) -> Self {
        Self {
            cpu,
            console: Mutex::new(String::new()),
            woken: Mutex::new(Vec::new()),
            released: Mutex::new(Vec::new()),
            missing: Mutex::new(BTreeSet::new()),
            keypresses: Mutex::new(0),
        }
    }

    pub fn console(&self) -> String {
        self.console.lock().clone()
    }

    pub fn woken(&self) -> Vec<Pid> {
        self.woken.lock().clone()
    }

    /// How many times `pid` was woken.
    pub fn wake_count(&self, pid: Pid) -> usize {
        self.woken.lock().iter().filter(|p| **p == pid).count()
    }

    pub fn clear_woken(&self) {
        self.woken.lock().clear();
    }

    pub fn released(&self) -> Vec<Pid> {
        self.released.lock().clone()
    }

    /// Make `release_resources(pid)` report a missing resource.
    pub fn lose_resources_of(&self, pid: Pid) {
        self.missing.lock().insert(pid);
    }

    pub fn keypresses(&self) -> usize {
        *self.keypresses.lock()
    }
}

impl Default for MockHal {
    fn default() -> Self {
        Self::new()
    }
}

impl Hal for MockHal {
    fn cpu_level(&self) -> CpuLevel {
        self.cpu
    }

    fn halt(&self) -> ! {
        panic!("{}", HALTED)
    }

    fn early_putchar(&self, c: u8) {
        self.console.lock().push(c as char);
    }

    fn wait_for_keypress(&self) -> u8 {
        *self.keypresses.lock() += 1;
        b'\r'
    }

    fn wake(&self, pid: Pid) {
        self.woken.lock().push(pid);
    }

    fn schedule_away(&self, pid: Pid) -> ! {
        panic!("mock hal: scheduled away from {}", pid)
    }

    fn release_resources(&self, pid: Pid) -> Result<(), MissingResource> {
        self.released.lock().push(pid);
        if self.missing.lock().contains(&pid) {
            return Err(MissingResource { what: "file table" });
        }
        Ok(())
    }
}

/// Boot a kernel on a fresh mock HAL with the given boot options.
pub fn boot_with(options: &str) -> (Arc<MockHal>, Kernel) {
    let hal = Arc::new(MockHal::new());
    let kernel = match rmk_core::entry::boot(&BootParams::parse(options), hal.clone()) {
        Ok(kernel) => kernel,
        Err(err) => panic!("mock boot failed: {}", err),
    };
    (hal, kernel)
}

/// Boot with default options.
pub fn boot() -> (Arc<MockHal>, Kernel) {
    boot_with("")
}
