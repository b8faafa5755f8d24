//! Status command - per-sector protection and blank state

use m0flash_core::Tristate;
use m0flash_dmem::bus::MemApBus;

use super::probed_bank;

fn tri(state: Tristate, yes: &str, no: &str) -> String {
    match state {
        Tristate::Yes => yes.to_string(),
        Tristate::No => no.to_string(),
        Tristate::Unknown => "unknown".to_string(),
    }
}

pub fn run(bus: &mut MemApBus, base: u32) -> Result<(), Box<dyn std::error::Error>> {
    let mut bank = probed_bank(bus, base)?;
    bank.protect_check(bus)?;
    bank.erase_check(bus)?;

    println!(
        "{}: {} sectors of {} bytes",
        bank.device()?.name,
        bank.num_sectors(),
        m0flash_core::SECTOR_SIZE
    );

    // Collapse consecutive sectors with identical state into ranges
    let sectors = bank.sectors();
    let mut start = 0;
    while start < sectors.len() {
        let state = (sectors[start].is_protected, sectors[start].is_erased);
        let mut end = start + 1;
        while end < sectors.len()
            && (sectors[end].is_protected, sectors[end].is_erased) == state
        {
            end += 1;
        }
        println!(
            "  {start:>4}..{end:<4} {}, {}",
            tri(state.0, "protected", "unprotected"),
            tri(state.1, "blank", "not blank")
        );
        start = end;
    }
    Ok(())
}
