//! Command implementations, one module per subcommand

pub mod erase;
pub mod info;
pub mod probe;
pub mod protect;
pub mod read;
pub mod status;
pub mod write;

use m0flash_core::{FlashBank, TargetBus};

/// Declare and probe a bank; shared preamble for every flash command
pub fn probed_bank(
    bus: &mut impl TargetBus,
    base: u32,
) -> Result<FlashBank, Box<dyn std::error::Error>> {
    let mut bank = FlashBank::new(base)?;
    bank.probe(bus)?;
    Ok(bank)
}
