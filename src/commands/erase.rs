//! Erase command

use m0flash_dmem::bus::MemApBus;

use super::probed_bank;

pub fn run(
    bus: &mut MemApBus,
    base: u32,
    first: u32,
    last: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut bank = probed_bank(bus, base)?;
    let last = last.unwrap_or_else(|| bank.num_sectors());

    bank.erase(bus, first, last)?;
    println!("Erased sectors {first}..{last}");
    Ok(())
}
