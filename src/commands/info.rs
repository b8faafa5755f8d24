//! Info command - chip information summary

use m0flash_dmem::bus::MemApBus;

use super::probed_bank;

pub fn run(bus: &mut MemApBus, base: u32) -> Result<(), Box<dyn std::error::Error>> {
    let bank = probed_bank(bus, base)?;
    println!("{}", bank.info()?);
    Ok(())
}
