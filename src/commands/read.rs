//! Read command - dump flash contents to a file

use std::path::Path;

use m0flash_dmem::bus::MemApBus;

use super::probed_bank;

pub fn run(
    bus: &mut MemApBus,
    base: u32,
    offset: u32,
    length: Option<u32>,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut bank = probed_bank(bus, base)?;
    let length = match length {
        Some(n) => n,
        None => bank.size().saturating_sub(offset),
    };

    let mut buf = vec![0u8; length as usize];
    bank.read(bus, offset, &mut buf)?;
    std::fs::write(output, &buf)
        .map_err(|e| format!("Failed to write {}: {e}", output.display()))?;
    println!("Read {length} bytes to {}", output.display());
    Ok(())
}
