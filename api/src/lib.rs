//! Kernel-side implementation of the process lifecycle syscalls: exit,
//! signal delivery to processes, groups and sessions, wait, fork and job
//! control, plus the privilege predicates they rely on.
#![no_std]

extern crate alloc;
#[macro_use]
extern crate log;

pub mod imp;
pub mod interface;
