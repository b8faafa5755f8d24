//! Write command - program a file into flash

use std::path::Path;

use m0flash_dmem::bus::MemApBus;

use super::probed_bank;

pub fn run(
    bus: &mut MemApBus,
    base: u32,
    offset: u32,
    input: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(input)
        .map_err(|e| format!("Failed to read {}: {e}", input.display()))?;

    let mut bank = probed_bank(bus, base)?;
    bank.write(bus, offset, &data)?;
    println!("Wrote {} bytes at offset {offset:#x}", data.len());
    Ok(())
}
