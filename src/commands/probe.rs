//! Probe command - identify the chip

use m0flash_dmem::bus::MemApBus;

use super::probed_bank;

pub fn run(bus: &mut MemApBus, base: u32) -> Result<(), Box<dyn std::error::Error>> {
    let bank = probed_bank(bus, base)?;
    let dev = bank.device()?;

    println!("Found: {} rev {}", dev.name, dev.version);
    println!(
        "main flash: {}KiB in {} bank(s), data flash: {}KiB, sram: {}KiB",
        dev.main_flash_kib, dev.main_flash_banks, dev.data_flash_kib, dev.sram_kib
    );
    println!(
        "selected bank: {} bytes, {} sectors of {} bytes",
        bank.size(),
        bank.num_sectors(),
        m0flash_core::SECTOR_SIZE
    );
    Ok(())
}
