//! Erase, program, and blank-check against the FCTL command engine
//!
//! Every command is staged into CMDTYPE/CMDADDR (plus CMDBYTEN/CMDDATAx for
//! program), triggered via CMDEXEC, and completed by polling STATCMD. The
//! hardware re-arms the CMDWEPROTx registers to a protected state at the end
//! of every program and erase, so the live values are captured up front and
//! written back after each command.

use std::time::{Duration, Instant};

use log::error;

use crate::bank::{FlashBank, Tristate};
use crate::error::{Error, Result};
use crate::regs::{fctl, StatCmd};
use crate::target::TargetBus;

/// Per-command completion deadline
const CMD_TIMEOUT: Duration = Duration::from_millis(8000);

/// Keep-alive cadence while polling
const KEEP_ALIVE_AFTER: Duration = Duration::from_millis(500);

impl FlashBank {
    /// Poll STATCMD until the staged command completes
    fn wait_cmd_ok(&self, bus: &mut dyn TargetBus) -> Result<()> {
        let start = Instant::now();
        let stat = loop {
            let stat = StatCmd::from_bits_retain(bus.read_u32(fctl::STATCMD)?);
            if stat.contains(StatCmd::CMDDONE) {
                break stat;
            }
            let elapsed = start.elapsed();
            if elapsed > KEEP_ALIVE_AFTER {
                bus.keep_alive();
            }
            if elapsed > CMD_TIMEOUT {
                error!("{}: Flash command timed out", self.name());
                return Err(Error::Timeout);
            }
        };

        if !stat.contains(StatCmd::CMDPASS) {
            error!("{}: Flash command failed: {}", self.name(), stat.describe());
            return Err(Error::CommandFailed(stat));
        }
        Ok(())
    }

    fn check_halted(&self, bus: &mut dyn TargetBus) -> Result<()> {
        if !bus.is_halted()? {
            error!("{}: Please halt target before touching flash", self.name());
            return Err(Error::NotHalted);
        }
        Ok(())
    }

    /// Fail with `SectorProtected` if any sector in `[first, last)` has its
    /// protection bit set; the state is re-read from hardware first.
    fn check_unprotected(&mut self, bus: &mut dyn TargetBus, first: u32, last: u32) -> Result<()> {
        self.protect_check(bus)?;
        for i in first..last {
            if self.sectors[i as usize].is_protected == Tristate::Yes {
                error!("{}: Sector {i} is protected", self.name());
                return Err(Error::SectorProtected(i));
            }
        }
        Ok(())
    }

    /// Erase the sectors `[first, last)`
    ///
    /// Requires a halted target and a probed bank; refuses if any addressed
    /// sector is protected. The pre-erase protection configuration is
    /// restored after every sector.
    pub fn erase(&mut self, bus: &mut dyn TargetBus, first: u32, last: u32) -> Result<()> {
        self.check_halted(bus)?;
        if !self.is_probed() {
            return Err(Error::NotProbed);
        }
        self.check_sector_range(first, last)?;
        self.check_unprotected(bus, first, last)?;

        let prot = self.read_protect_regs(bus)?;

        for sector in first..last {
            let addr = sector * self.sector_size;
            bus.write_u32(
                fctl::CMDTYPE,
                fctl::CMDTYPE_COMMAND_ERASE | fctl::CMDTYPE_SIZE_SECTOR,
            )?;
            bus.write_u32(fctl::CMDADDR, addr)?;
            bus.write_u32(fctl::CMDEXEC, fctl::CMDEXEC_EXECUTE)?;
            self.wait_cmd_ok(bus).inspect_err(|_| {
                error!(
                    "{}: Failed erasing at address {addr:#010x} (sector: {sector})",
                    self.name()
                );
            })?;
            // The engine re-armed protection; put the user's config back
            self.write_protect_regs(bus, &prot)?;
        }

        Ok(())
    }

    /// Program `data` starting at byte `offset` within the bank
    ///
    /// `offset` must be flash-word aligned; sub-word tails are masked via
    /// CMDBYTEN. A zero-length program is a successful no-op.
    pub fn write(&mut self, bus: &mut dyn TargetBus, offset: u32, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }

        self.check_halted(bus)?;
        if !self.is_probed() {
            return Err(Error::NotProbed);
        }
        if offset % self.flash_word_size != 0 {
            error!(
                "{}: Offset {offset:#x} must be aligned to {} bytes",
                self.name(),
                self.flash_word_size
            );
            return Err(Error::Misaligned {
                offset,
                required: self.flash_word_size,
            });
        }

        let count = data.len() as u32;
        if offset.checked_add(count).is_none_or(|end| end > self.size) {
            return Err(Error::OutOfBounds);
        }
        let first_sec = offset / self.sector_size;
        let last_sec = (offset + count - 1) / self.sector_size;
        self.check_unprotected(bus, first_sec, last_sec + 1)?;

        // Captured once; the engine re-arms protection after every word
        let prot = self.read_protect_regs(bus)?;

        let mut offset = offset;
        let mut remaining = data;
        while !remaining.is_empty() {
            let n = remaining.len().min(self.flash_word_size as usize);

            // One enable bit per data byte, then the ECC-chunk enables
            let mut byte_en = (1u32 << n) - 1;
            match self.flash_word_size {
                8 => byte_en |= 1 << 8,
                16 => {
                    byte_en |= 1 << 16;
                    if n > 8 {
                        byte_en |= 1 << 17;
                    }
                }
                other => {
                    error!("{}: Invalid flash word size {other}", self.name());
                    return Err(Error::DriverBug);
                }
            }

            bus.write_u32(
                fctl::CMDTYPE,
                fctl::CMDTYPE_COMMAND_PROGRAM | fctl::CMDTYPE_SIZE_ONEWORD,
            )?;
            bus.write_u32(fctl::CMDBYTEN, byte_en)?;
            bus.write_u32(fctl::CMDADDR, offset)?;

            for (i, chunk) in remaining[..n].chunks(4).enumerate() {
                let mut word = [0u8; 4];
                word[..chunk.len()].copy_from_slice(chunk);
                bus.write_u32(
                    fctl::CMDDATA0 + (i as u32 * 4),
                    u32::from_le_bytes(word),
                )?;
            }

            bus.write_u32(fctl::CMDEXEC, fctl::CMDEXEC_EXECUTE)?;
            self.wait_cmd_ok(bus)?;
            self.write_protect_regs(bus, &prot)?;

            offset += n as u32;
            remaining = &remaining[n..];
        }

        Ok(())
    }

    /// Read `buf.len()` bytes starting at byte `offset` within the bank
    pub fn read(&mut self, bus: &mut dyn TargetBus, offset: u32, buf: &mut [u8]) -> Result<()> {
        if !self.is_probed() {
            return Err(Error::NotProbed);
        }
        let count = buf.len() as u32;
        if offset.checked_add(count).is_none_or(|end| end > self.size) {
            return Err(Error::OutOfBounds);
        }

        let base = self.kind.base() + offset;
        let mut pos = 0usize;
        while pos < buf.len() {
            // Word-aligned bus, byte-granular caller: shift the head/tail out
            let addr = (base + pos as u32) & !3;
            let shift = (base + pos as u32) & 3;
            let word = bus.read_u32(addr)?.to_le_bytes();
            let take = (4 - shift as usize).min(buf.len() - pos);
            buf[pos..pos + take].copy_from_slice(&word[shift as usize..shift as usize + take]);
            pos += take;
        }
        Ok(())
    }

    /// Refresh every sector's erased tri-state by reading it back
    pub fn erase_check(&mut self, bus: &mut dyn TargetBus) -> Result<()> {
        if !self.is_probed() {
            return Err(Error::NotProbed);
        }

        let base = self.kind.base();
        for i in 0..self.sectors.len() {
            let sector = self.sectors[i];
            let mut blank = true;
            for word_off in (0..sector.size).step_by(4) {
                if bus.read_u32(base + sector.offset + word_off)? != u32::MAX {
                    blank = false;
                    break;
                }
            }
            self.sectors[i].is_erased = blank.into();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::BankKind;
    use crate::testbus::FakeTarget;

    fn probed_main_bank(bus: &mut FakeTarget) -> FlashBank {
        let mut bank = FlashBank::new(BankKind::MAIN_BASE).unwrap();
        bank.probe(bus).unwrap();
        bank
    }

    #[test]
    fn erase_single_sector_command_sequence() {
        let mut bus = FakeTarget::mspm0g3507();
        bus.set(fctl::CMDWEPROTA, 0xdead_0000);
        bus.set(fctl::CMDWEPROTA + 4, 0x1111_2222);
        let mut bank = probed_main_bank(&mut bus);

        bank.erase(&mut bus, 0, 1).unwrap();

        assert_eq!(bus.writes_to(fctl::CMDTYPE), vec![0x42]);
        assert_eq!(bus.writes_to(fctl::CMDADDR), vec![0]);
        assert_eq!(bus.writes_to(fctl::CMDEXEC), vec![1]);
        // The pre-captured protection snapshot went back out afterwards
        assert_eq!(bus.writes_to(fctl::CMDWEPROTA), vec![0xdead_0000]);
        assert_eq!(bus.writes_to(fctl::CMDWEPROTA + 4), vec![0x1111_2222]);
        assert_eq!(bus.writes_to(fctl::CMDWEPROTA + 8), vec![0]);
    }

    #[test]
    fn erase_addresses_scale_by_sector_size() {
        let mut bus = FakeTarget::mspm0g3507();
        let mut bank = probed_main_bank(&mut bus);
        bank.erase(&mut bus, 2, 5).unwrap();
        assert_eq!(bus.writes_to(fctl::CMDADDR), vec![0x800, 0xc00, 0x1000]);
    }

    #[test]
    fn erase_refuses_protected_sector_without_executing() {
        let mut bus = FakeTarget::mspm0g3507();
        bus.set(fctl::CMDWEPROTA, 1 << 3);
        let mut bank = probed_main_bank(&mut bus);

        assert_eq!(bank.erase(&mut bus, 0, 4), Err(Error::SectorProtected(3)));
        assert!(bus.writes_to(fctl::CMDEXEC).is_empty());
    }

    #[test]
    fn erase_requires_halted_target() {
        let mut bus = FakeTarget::mspm0g3507();
        bus.set_halted(false);
        let mut bank = probed_main_bank(&mut bus);
        assert_eq!(bank.erase(&mut bus, 0, 1), Err(Error::NotHalted));
    }

    #[test]
    fn erase_surfaces_command_failure_bits() {
        let mut bus = FakeTarget::mspm0g3507();
        let mut bank = probed_main_bank(&mut bus);
        bus.set(fctl::STATCMD, 0x1 | (1 << 4)); // done, FAILWEPROT
        let err = bank.erase(&mut bus, 0, 1).unwrap_err();
        match err {
            Error::CommandFailed(stat) => assert!(stat.contains(StatCmd::FAILWEPROT)),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn write_five_bytes_is_one_masked_word() {
        let mut bus = FakeTarget::mspm0g3507();
        let mut bank = probed_main_bank(&mut bus);

        bank.write(&mut bus, 0, &[0x11, 0x22, 0x33, 0x44, 0x55])
            .unwrap();

        assert_eq!(bus.writes_to(fctl::CMDBYTEN), vec![0x11f]);
        assert_eq!(bus.writes_to(fctl::CMDTYPE), vec![0x1]);
        assert_eq!(bus.writes_to(fctl::CMDDATA0), vec![0x4433_2211]);
        assert_eq!(bus.writes_to(fctl::CMDDATA0 + 4), vec![0x0000_0055]);
        assert_eq!(bus.writes_to(fctl::CMDEXEC), vec![1]);
    }

    #[test]
    fn write_full_word_byte_enables() {
        let mut bus = FakeTarget::mspm0g3507();
        let mut bank = probed_main_bank(&mut bus);
        bank.write(&mut bus, 0, &[0xab; 8]).unwrap();
        assert_eq!(bus.writes_to(fctl::CMDBYTEN), vec![0x1ff]);
    }

    #[test]
    fn byte_enables_track_tail_length() {
        // One enable bit per byte plus the 8-byte ECC chunk bit
        for n in 1..=8u32 {
            let mut bus = FakeTarget::mspm0g3507();
            let mut bank = probed_main_bank(&mut bus);
            bank.write(&mut bus, 0, &vec![0u8; n as usize]).unwrap();
            assert_eq!(
                bus.writes_to(fctl::CMDBYTEN),
                vec![((1 << n) - 1) | (1 << 8)],
                "n = {n}"
            );
        }
    }

    #[test]
    fn write_spans_words_and_restores_protection_each_time() {
        let mut bus = FakeTarget::mspm0g3507();
        bus.set(fctl::CMDWEPROTA + 8, 0xcafe_f00d);
        let mut bank = probed_main_bank(&mut bus);

        bank.write(&mut bus, 0x10, &[0x5a; 20]).unwrap();

        // 8 + 8 + 4 bytes
        assert_eq!(bus.writes_to(fctl::CMDADDR), vec![0x10, 0x18, 0x20]);
        assert_eq!(bus.writes_to(fctl::CMDBYTEN), vec![0x1ff, 0x1ff, 0x10f]);
        assert_eq!(bus.writes_to(fctl::CMDEXEC).len(), 3);
        assert_eq!(
            bus.writes_to(fctl::CMDWEPROTA + 8),
            vec![0xcafe_f00d, 0xcafe_f00d, 0xcafe_f00d]
        );
    }

    #[test]
    fn write_rejects_misaligned_offset() {
        let mut bus = FakeTarget::mspm0g3507();
        let mut bank = probed_main_bank(&mut bus);
        assert_eq!(
            bank.write(&mut bus, 5, &[0x00]),
            Err(Error::Misaligned {
                offset: 5,
                required: 8
            })
        );
    }

    #[test]
    fn empty_write_succeeds_even_misaligned() {
        let mut bus = FakeTarget::mspm0g3507();
        let mut bank = probed_main_bank(&mut bus);
        bank.write(&mut bus, 5, &[]).unwrap();
        assert!(bus.writes.is_empty());
    }

    #[test]
    fn write_refuses_protected_overlap() {
        let mut bus = FakeTarget::mspm0g3507();
        bus.set(fctl::CMDWEPROTA, 1 << 1);
        let mut bank = probed_main_bank(&mut bus);
        // Bytes 0x3f8..0x410 touch sectors 0 and 1
        assert_eq!(
            bank.write(&mut bus, 0x3f8, &[0u8; 0x18]),
            Err(Error::SectorProtected(1))
        );
        assert!(bus.writes_to(fctl::CMDEXEC).is_empty());
    }

    #[test]
    fn write_rejects_out_of_bank() {
        let mut bus = FakeTarget::mspm0g3507();
        let mut bank = probed_main_bank(&mut bus);
        let end = bank.size();
        assert_eq!(
            bank.write(&mut bus, end - 8, &[0u8; 16]),
            Err(Error::OutOfBounds)
        );
    }

    #[test]
    fn erase_check_reads_back_sectors() {
        let mut bus = FakeTarget::mspm0g3507();
        let mut bank = FlashBank::new(BankKind::NONMAIN_BASE).unwrap();
        bank.probe(&mut bus).unwrap();

        // All-ones sector reads as blank
        for off in (0..512).step_by(4) {
            bus.set(BankKind::NONMAIN_BASE + off, u32::MAX);
        }
        bank.erase_check(&mut bus).unwrap();
        assert_eq!(bank.sectors()[0].is_erased, Tristate::Yes);

        bus.set(BankKind::NONMAIN_BASE + 0x100, 0xdead_beef);
        bank.erase_check(&mut bus).unwrap();
        assert_eq!(bank.sectors()[0].is_erased, Tristate::No);
    }

    #[test]
    fn read_handles_unaligned_head_and_tail() {
        let mut bus = FakeTarget::mspm0g3507();
        let mut bank = FlashBank::new(BankKind::NONMAIN_BASE).unwrap();
        bank.probe(&mut bus).unwrap();
        bus.set(BankKind::NONMAIN_BASE, u32::from_le_bytes([1, 2, 3, 4]));
        bus.set(BankKind::NONMAIN_BASE + 4, u32::from_le_bytes([5, 6, 7, 8]));

        let mut buf = [0u8; 5];
        bank.read(&mut bus, 1, &mut buf).unwrap();
        assert_eq!(buf, [2, 3, 4, 5, 6]);
    }
}
