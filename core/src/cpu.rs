//! Processor capability level, fixed at boot.

use core::fmt;

/// Ordered processor variants, used for feature selection.
///
/// The order is strictly increasing in instruction-set capability, so a
/// feature check is a plain comparison: `level >= CpuLevel::I80286`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum CpuLevel {
    #[default]
    I8088 = 0,
    I8086 = 1,
    NecV20 = 2,
    NecV30 = 3,
    I80188 = 4,
    I80186 = 5,
    /// First PC/AT.
    I80286 = 6,
    /// 80386 or later; nothing newer is told apart.
    I80386 = 7,
}

impl CpuLevel {
    pub fn from_raw(raw: u8) -> Option<Self> {
        Some(match raw {
            0 => CpuLevel::I8088,
            1 => CpuLevel::I8086,
            2 => CpuLevel::NecV20,
            3 => CpuLevel::NecV30,
            4 => CpuLevel::I80188,
            5 => CpuLevel::I80186,
            6 => CpuLevel::I80286,
            7 => CpuLevel::I80386,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            CpuLevel::I8088 => "8088",
            CpuLevel::I8086 => "8086",
            CpuLevel::NecV20 => "NEC V20",
            CpuLevel::NecV30 => "NEC V30",
            CpuLevel::I80188 => "80188",
            CpuLevel::I80186 => "80186",
            CpuLevel::I80286 => "80286",
            CpuLevel::I80386 => "80386+",
        }
    }

    pub fn at_least(self, other: CpuLevel) -> bool {
        self >= other
    }

    /// `enter`/`leave`, `push imm`, shifts by immediate counts.
    pub fn has_186_instructions(self) -> bool {
        self.at_least(CpuLevel::I80188)
    }

    pub fn has_protected_mode(self) -> bool {
        self.at_least(CpuLevel::I80286)
    }

    pub fn is_32bit(self) -> bool {
        self.at_least(CpuLevel::I80386)
    }
}

impl fmt::Display for CpuLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Boot-time processor facts. Built once by the boot sequence and only read
/// afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuInfo {
    level: CpuLevel,
    running_qemu: bool,
    debug_level: i32,
}

impl CpuInfo {
    pub fn new(level: CpuLevel, running_qemu: bool, debug_level: i32) -> Self {
        Self {
            level,
            running_qemu,
            debug_level,
        }
    }

    pub fn level(&self) -> CpuLevel {
        self.level
    }

    /// Whether the kernel runs under an emulator.
    pub fn running_qemu(&self) -> bool {
        self.running_qemu
    }

    /// Verbosity of diagnostic output; 0 keeps only ordinary messages.
    pub fn debug_level(&self) -> i32 {
        self.debug_level
    }
}
