//! Boot options.
//!
//! Options are whitespace separated `key=value` words, or bare flags:
//! `debug=2 qemu cpu=6 maxtasks=20 logsize=128 pause`.

use crate::cpu::CpuLevel;
use rmk_process::MAX_TASKS;

/// Default number of lines kept by the diagnostics ring.
pub const LOG_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootParams {
    /// Forced processor level; probed from the hardware when `None`.
    pub cpu: Option<CpuLevel>,
    pub running_qemu: bool,
    pub debug_level: i32,
    pub max_tasks: usize,
    pub log_capacity: usize,
    /// Wait for a keypress before starting init.
    pub pause: bool,
}

impl Default for BootParams {
    fn default() -> Self {
        Self {
            cpu: None,
            running_qemu: false,
            debug_level: 0,
            max_tasks: MAX_TASKS,
            log_capacity: LOG_CAPACITY,
            pause: false,
        }
    }
}

impl BootParams {
    /// Parse a boot option line. Unknown or malformed options are reported
    /// and skipped; they never stop the boot.
    pub fn parse(options: &str) -> Self {
        let mut params = Self::default();
        for word in options.split_whitespace() {
            let (key, value) = match word.split_once('=') {
                Some((key, value)) => (key, Some(value)),
                None => (word, None),
            };
            match (key, value) {
                ("qemu", None) => params.running_qemu = true,
                ("qemu", Some(v)) => params.running_qemu = v != "0",
                ("pause", None) => params.pause = true,
                ("debug", Some(v)) => match v.parse() {
                    Ok(level) => params.debug_level = level,
                    Err(_) => warn!("bootopts: bad debug level {:?}", v),
                },
                ("cpu", Some(v)) => match v.parse().ok().and_then(CpuLevel::from_raw) {
                    Some(level) => params.cpu = Some(level),
                    None => warn!("bootopts: bad cpu level {:?}", v),
                },
                ("maxtasks", Some(v)) => match v.parse::<usize>() {
                    Ok(n) if n > 0 => params.max_tasks = n,
                    _ => warn!("bootopts: bad task limit {:?}", v),
                },
                ("logsize", Some(v)) => match v.parse::<usize>() {
                    Ok(n) if n > 0 => params.log_capacity = n,
                    _ => warn!("bootopts: bad log size {:?}", v),
                },
                _ => warn!("bootopts: unknown option {:?}", word),
            }
        }
        params
    }

    /// Options compiled in through `RMK_BOOTOPTS`, or the defaults.
    pub fn from_env() -> Self {
        Self::parse(option_env!("RMK_BOOTOPTS").unwrap_or(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_line_gives_defaults() {
        assert_eq!(BootParams::parse(""), BootParams::default());
        assert_eq!(BootParams::parse("   ").max_tasks, MAX_TASKS);
    }

    #[test]
    fn parses_every_option() {
        let params = BootParams::parse("debug=2 qemu cpu=6 maxtasks=20 logsize=8 pause");
        assert_eq!(params.debug_level, 2);
        assert!(params.running_qemu);
        assert_eq!(params.cpu, Some(CpuLevel::I80286));
        assert_eq!(params.max_tasks, 20);
        assert_eq!(params.log_capacity, 8);
        assert!(params.pause);
    }

    #[test]
    fn bad_values_keep_defaults() {
        let params = BootParams::parse("debug=x cpu=9 maxtasks=0 logsize=-1 frobnicate qemu=0");
        assert_eq!(params, BootParams::default());
    }
}
