#![no_std]

extern crate alloc;
#[macro_use]
extern crate log;

pub mod config;
pub mod cpu;
pub mod diag;
pub mod entry;
pub mod error;
pub mod hal;
pub mod kernel;
pub mod task;

pub use kernel::{Kernel, Transfer};
