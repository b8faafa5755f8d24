//! Target bus trait definition

use crate::error::Result;

/// Word-granular access to the target's physical address space.
///
/// The flash driver issues every transaction through this trait, so it works
/// the same whether the backend is a debug probe, a direct-memory window, or
/// an in-memory fake. All transactions are serialized and observed in issue
/// order by the flash engine.
pub trait TargetBus {
    /// Read a 32-bit word from an absolute target address
    fn read_u32(&mut self, addr: u32) -> Result<u32>;

    /// Write a 32-bit word to an absolute target address
    fn write_u32(&mut self, addr: u32, val: u32) -> Result<()>;

    /// Whether the target core is currently halted
    ///
    /// Erase and program require a halted core; probe does not.
    fn is_halted(&mut self) -> Result<bool>;

    /// Liveness callback invoked during long hardware polls
    ///
    /// Called at least every 500 ms while waiting on a flash command, so a
    /// hosting session can service its own keep-alive protocol.
    fn keep_alive(&mut self) {}
}
