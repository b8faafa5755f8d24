//! Error types for the dmem DAP adapter

use thiserror::Error;

/// Errors raised by the dmem adapter
#[derive(Debug, Clone, Error)]
pub enum DmemError {
    /// The DAP window base address was never configured
    #[error("dmem DAP base address not set")]
    BaseAddressNotSet,

    /// Opening the backing memory device failed
    #[error("unable to open {path}: {reason}")]
    DeviceOpen {
        /// Device path that failed to open
        path: String,
        /// OS error text
        reason: String,
    },

    /// mmap of a physical window failed
    #[error("mapping address {addr:#x} for {len:#x} bytes failed")]
    MapFailed {
        /// Physical base of the attempted mapping
        addr: u64,
        /// Length of the attempted mapping
        len: usize,
    },

    /// Emulated window base or size not page aligned
    #[error("emulated window {addr:#x}/{len:#x} must be aligned to the page size {page:#x}")]
    AlignmentError {
        /// Configured emulated window base
        addr: u64,
        /// Configured emulated window size
        len: u64,
        /// Host page size
        page: usize,
    },

    /// More emulated APs configured than the adapter supports
    #[error("too many emulated APs: {0} (max {max})", max = crate::config::MAX_EMULATED_APS)]
    TooManyEmulatedAps(usize),

    /// ADIv6 access ports cannot be reached through plain memory cycles
    #[error("ADIv6 dap not supported by dmem dap-direct mode")]
    Adiv6Unsupported,

    /// Register offset with no emulation rule
    #[error("unknown AP register {0:#04x}")]
    InvalidRegister(u16),

    /// Adapter used before init or after quit
    #[error("dmem adapter not initialized")]
    NotInitialized,
}

/// Result type for dmem adapter operations
pub type Result<T> = std::result::Result<T, DmemError>;
