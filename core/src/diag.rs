//! Kernel diagnostics: a bounded message ring echoed to the early console.

use crate::hal::Hal;
use alloc::collections::VecDeque;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use log::{Level, LevelFilter, Metadata, Record};
use spin::Mutex;

struct LogRing {
    lines: VecDeque<String>,
    capacity: usize,
    dropped: usize,
}

impl LogRing {
    fn push(&mut self, line: String) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
            self.dropped += 1;
        }
        self.lines.push_back(line);
    }
}

/// The kernel's diagnostic stream.
///
/// Writing never fails and never waits for a reader: when the ring is full
/// the oldest line goes.
pub struct Diagnostics {
    ring: Mutex<LogRing>,
    debug_level: i32,
    console: Arc<dyn Hal>,
}

impl Diagnostics {
    pub fn new(capacity: usize, debug_level: i32, console: Arc<dyn Hal>) -> Self {
        Self {
            ring: Mutex::new(LogRing {
                lines: VecDeque::with_capacity(capacity),
                capacity: capacity.max(1),
                dropped: 0,
            }),
            debug_level,
            console,
        }
    }

    /// Append a formatted line and echo it to the console.
    pub fn printk(&self, args: fmt::Arguments) {
        self.write_line(format!("{}", args));
    }

    fn write_line(&self, line: String) {
        for byte in line.bytes().chain(core::iter::once(b'\n')) {
            self.console.early_putchar(byte);
        }
        self.ring.lock().push(line);
    }

    /// The level filter matching the boot verbosity.
    pub fn max_level(&self) -> LevelFilter {
        match self.debug_level {
            i32::MIN..=0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Snapshot of the retained lines, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.ring.lock().lines.iter().cloned().collect()
    }

    /// Number of lines lost to overflow.
    pub fn dropped(&self) -> usize {
        self.ring.lock().dropped
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.ring.lock().lines.iter().any(|line| line.contains(needle))
    }
}

impl log::Log for Diagnostics {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = match record.level() {
            Level::Info => format!("{}", record.args()),
            level => format!("[{}] {}", level, record.args()),
        };
        self.write_line(line);
    }

    fn flush(&self) {}
}
