//! rmk: the process-lifecycle core of a small real-mode kernel.
//!
//! [`init`] boots the core on a platform [`Hal`], installs the diagnostics
//! sink as the `log` backend and keeps the [`Kernel`] for the rest of the
//! machine's life. Syscalls enter through [`handle_syscall`].
#![no_std]

extern crate alloc;
#[macro_use]
extern crate log;

pub mod syscall;

use alloc::sync::Arc;
use rmk_core::config::BootParams;
use rmk_core::error::KernelResult;
use rmk_core::hal::Hal;
use spin::Once;

pub use rmk_core::{Kernel, Transfer};
pub use syscall::{TrapFrame, handle_syscall};

static KERNEL: Once<Kernel> = Once::new();

/// Boot with the options baked in at build time through `RMK_BOOTOPTS`.
pub fn init(hal: Arc<dyn Hal>) -> KernelResult<&'static Kernel> {
    init_with(&BootParams::from_env(), hal)
}

/// Boot the kernel core once. Later calls return the kernel already running.
pub fn init_with(params: &BootParams, hal: Arc<dyn Hal>) -> KernelResult<&'static Kernel> {
    if let Some(kernel) = KERNEL.get() {
        warn!("[init] kernel already booted");
        return Ok(kernel);
    }
    let kernel = rmk_core::entry::boot(params, hal)?;
    let kernel = KERNEL.call_once(|| kernel);
    match log::set_logger(kernel.diag()) {
        Ok(()) => log::set_max_level(kernel.diag().max_level()),
        Err(_) => kernel.printk(format_args!("init: logger already installed")),
    }
    info!("[init] kernel core up");
    Ok(kernel)
}

/// The running kernel, once [`init`] has succeeded.
pub fn kernel() -> Option<&'static Kernel> {
    KERNEL.get()
}
