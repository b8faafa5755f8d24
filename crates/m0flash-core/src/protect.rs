//! Sector write/erase protection
//!
//! Each CMDWEPROTx bit blocks erase/program for one or more sectors. The
//! sector-to-bit mapping depends on the bank topology: the first 32 MAIN
//! sectors get one bit each, higher sectors share one bit per 8 sectors,
//! folded per hardware bank.

use log::{debug, error};

use crate::bank::{BankKind, FlashBank, Tristate};
use crate::error::{Error, Result};
use crate::target::TargetBus;

/// Upper bound on protection registers across all bank kinds
pub(crate) const MAX_PROT_REGS: usize = 3;

/// Fine-grained 1:1 protection covers this many low sectors
const FINE_GRAIN_SECTORS: u32 = 32;

impl FlashBank {
    /// Map a sector index to its protection register and bit
    ///
    /// Returns `(register_index, bit)` with `register_index` relative to
    /// `protect_reg_base`.
    pub(crate) fn protect_reg_map(&self, sector: u32) -> Result<(u32, u32)> {
        let (reg, bit) = match self.kind {
            BankKind::NonMain => (sector / 32, sector % 32),
            BankKind::Main => self.protect_reg_mainmap(sector)?,
            BankKind::Data => {
                error!("{}: Bank protection not available", self.name());
                return Err(Error::ProtectionUnavailable);
            }
        };

        if reg >= self.protect_reg_count {
            error!(
                "{}: sector {sector} overflows protection regs",
                self.name()
            );
            return Err(Error::MappingOutOfRange);
        }
        if bit >= 32 {
            error!(
                "{}: sector {sector} decodes to impossible reg bit {bit}",
                self.name()
            );
            return Err(Error::DriverBug);
        }

        Ok((reg, bit))
    }

    fn protect_reg_mainmap(&self, sector: u32) -> Result<(u32, u32)> {
        if sector < FINE_GRAIN_SECTORS {
            return Ok((0, sector));
        }

        let dev = self.device()?;
        // One sector is 1 KiB, so the KiB count doubles as a sector count
        let bank_size = dev.main_flash_kib / dev.main_flash_banks;
        if bank_size == 0 {
            return Err(Error::DriverBug);
        }
        let sector_in_bank = sector % bank_size;

        if sector_in_bank < 256 {
            let bit = if dev.main_flash_banks == 1 {
                (sector_in_bank - FINE_GRAIN_SECTORS) / 8
            } else {
                sector_in_bank / 8
            };
            return Ok((1, bit));
        }
        if sector_in_bank < 512 {
            return Ok((2, (sector_in_bank - 256) / 8));
        }

        error!(
            "{}: invalid sector_in_bank {sector_in_bank} for sector {sector}",
            self.name()
        );
        Err(Error::MappingOutOfRange)
    }

    /// Snapshot the live protection registers
    pub(crate) fn read_protect_regs(
        &self,
        bus: &mut dyn TargetBus,
    ) -> Result<[u32; MAX_PROT_REGS]> {
        let mut cache = [0u32; MAX_PROT_REGS];
        for (i, slot) in cache
            .iter_mut()
            .enumerate()
            .take(self.protect_reg_count as usize)
        {
            *slot = bus.read_u32(self.protect_reg_base + (i as u32 * 4))?;
        }
        Ok(cache)
    }

    /// Write a protection register snapshot back to hardware
    pub(crate) fn write_protect_regs(
        &self,
        bus: &mut dyn TargetBus,
        cache: &[u32; MAX_PROT_REGS],
    ) -> Result<()> {
        for (i, val) in cache
            .iter()
            .enumerate()
            .take(self.protect_reg_count as usize)
        {
            bus.write_u32(self.protect_reg_base + (i as u32 * 4), *val)?;
        }
        Ok(())
    }

    /// Derive every sector's protection tri-state from a register snapshot
    fn apply_protect_cache(&mut self, cache: &[u32; MAX_PROT_REGS]) {
        for i in 0..self.sectors.len() {
            self.sectors[i].is_protected = match self.protect_reg_map(i as u32) {
                Ok((reg, bit)) => (cache[reg as usize] & (1 << bit) != 0).into(),
                Err(err) => {
                    debug!("{}: sector {i} protect regmap fail: {err}", self.name());
                    Tristate::Unknown
                }
            };
        }
    }

    /// Refresh every sector's protection state from hardware
    pub fn protect_check(&mut self, bus: &mut dyn TargetBus) -> Result<()> {
        if !self.is_probed() {
            return Err(Error::NotProbed);
        }

        for sector in &mut self.sectors {
            sector.is_protected = Tristate::Unknown;
        }
        if self.protect_reg_count == 0 {
            return Ok(());
        }

        let cache = self.read_protect_regs(bus)?;
        self.apply_protect_cache(&cache);
        Ok(())
    }

    /// Protect or unprotect the sectors `[first, last)`
    ///
    /// The protection registers are re-read before modification; cached
    /// sector state is never trusted because the hardware re-arms protection
    /// behind the driver's back after every program/erase.
    pub fn protect(
        &mut self,
        bus: &mut dyn TargetBus,
        set: bool,
        first: u32,
        last: u32,
    ) -> Result<()> {
        if !self.is_probed() {
            return Err(Error::NotProbed);
        }
        if self.protect_reg_count == 0 {
            return Err(Error::ProtectionUnavailable);
        }
        self.check_sector_range(first, last)?;

        let mut cache = self.read_protect_regs(bus)?;
        for sector in first..last {
            let (reg, bit) = self.protect_reg_map(sector).inspect_err(|err| {
                error!("{}: sector {sector} protect regmap fail: {err}", self.name());
            })?;
            if set {
                cache[reg as usize] |= 1 << bit;
            } else {
                cache[reg as usize] &= !(1 << bit);
            }
        }
        self.write_protect_regs(bus, &cache)?;

        // A single bit can cover up to 8 sectors, so re-derive all of them
        self.apply_protect_cache(&cache);
        Ok(())
    }

    pub(crate) fn check_sector_range(&self, first: u32, last: u32) -> Result<()> {
        if first > last || last > self.num_sectors() {
            return Err(Error::OutOfBounds);
        }
        Ok(())
    }

    pub(crate) fn name(&self) -> &'static str {
        self.device.as_ref().map_or("mspm0", |d| d.name)
    }
}
