//! Protect/unprotect commands

use m0flash_dmem::bus::MemApBus;

use super::probed_bank;

pub fn run(
    bus: &mut MemApBus,
    base: u32,
    set: bool,
    first: u32,
    last: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut bank = probed_bank(bus, base)?;
    bank.protect(bus, set, first, last)?;
    println!(
        "{} sectors {first}..{last}",
        if set { "Protected" } else { "Unprotected" }
    );
    Ok(())
}
