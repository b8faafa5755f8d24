//! m0flash-core - Flash controller driver for TI MSPM0 microcontrollers
//!
//! This crate identifies MSPM0 L- and G-class parts from their on-die
//! identity registers, decodes the flash/SRAM geometry, and drives the FCTL
//! command engine to erase, program, and write-protect sectors.
//!
//! All target access goes through the [`target::TargetBus`] trait, so any
//! transport that can issue aligned 32-bit reads and writes against the
//! target's physical address space can host the driver.
//!
//! # Example
//!
//! ```ignore
//! use m0flash_core::{BankKind, FlashBank};
//!
//! fn erase_first_sector(bus: &mut impl m0flash_core::TargetBus) -> m0flash_core::Result<()> {
//!     let mut bank = FlashBank::new(BankKind::MAIN_BASE)?;
//!     bank.probe(bus)?;
//!     bank.erase(bus, 0, 1)
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod bank;
pub mod error;
pub mod parts;
pub mod regs;
pub mod target;

mod ops;
mod protect;

#[cfg(test)]
pub(crate) mod testbus;

pub use bank::{BankKind, DeviceInfo, FlashBank, Sector, Tristate, SECTOR_SIZE};
pub use error::{Error, Result};
pub use target::TargetBus;
