//! Error types for m0flash-core

use core::fmt;

use crate::regs::StatCmd;

/// Core error type, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Bank state errors
    /// Bank used before a successful probe
    NotProbed,
    /// Target must be halted for this operation
    NotHalted,
    /// Bank base address is not one of the recognized flash regions
    InvalidBankBase(u32),
    /// Chip identification failed (malformed DID or unknown family)
    ProbeFailed,

    // Protection errors
    /// Sector index does not fit the protection register scheme
    MappingOutOfRange,
    /// Protection-bit decode produced an impossible register/bit pair
    DriverBug,
    /// Bank has no protection registers
    ProtectionUnavailable,
    /// Erase/program touched a protected sector
    SectorProtected(u32),

    // Operation errors
    /// Program offset not aligned to the flash word size
    Misaligned {
        /// Requested offset
        offset: u32,
        /// Required alignment in bytes
        required: u32,
    },
    /// Operation extends beyond the bank
    OutOfBounds,
    /// Flash command engine reported a failure; carries the STATCMD bits
    CommandFailed(StatCmd),
    /// Command completion bit did not assert in time
    Timeout,

    // Transport errors
    /// Target bus transaction failed
    Bus,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotProbed => write!(f, "flash bank not probed"),
            Self::NotHalted => write!(f, "target not halted"),
            Self::InvalidBankBase(base) => write!(f, "invalid bank address {base:#010x}"),
            Self::ProbeFailed => write!(f, "cannot identify target"),
            Self::MappingOutOfRange => write!(f, "sector overflows protection registers"),
            Self::DriverBug => write!(f, "protection register decode bug"),
            Self::ProtectionUnavailable => write!(f, "bank protection not available"),
            Self::SectorProtected(sector) => write!(f, "sector {sector} is protected"),
            Self::Misaligned { offset, required } => {
                write!(f, "offset {offset:#x} must be aligned to {required} bytes")
            }
            Self::OutOfBounds => write!(f, "operation extends beyond the flash bank"),
            Self::CommandFailed(stat) => write!(f, "flash command failed: {}", stat.describe()),
            Self::Timeout => write!(f, "flash command timed out"),
            Self::Bus => write!(f, "target bus access failed"),
        }
    }
}

impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
