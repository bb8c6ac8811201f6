//! POSIX-like process bookkeeping for a small multitasking kernel.
//! A flat process table holds every process; process groups are views over
//! the table and sessions carry the controlling-terminal bookkeeping.
//! See https://man7.org/linux/man-pages/man7/credentials.7.html for more details.
#![no_std]

extern crate alloc;
#[macro_use]
extern crate log;

pub mod cred;
pub mod process;
pub mod process_group;
pub mod session;
pub mod signal;
pub mod table;

/// Type alias for session ID, process group ID and process ID.
pub type Pid = u32;

/// Device number of a terminal.
pub type DevT = u16;

/// The first process, adoptive parent of every orphan.
pub const INIT_PID: Pid = 1;

pub use cred::{Credentials, Gid, Uid};
pub use process::{Delivery, JobChange, Process, ProcessState};
pub use process_group::ProcessGroup;
pub use session::{HangUp, Session};
pub use signal::{SignalSet, Signo};
pub use table::{MAX_TASKS, ProcessTable, TableError};
