//! m0flash-dmem - Direct memory access to CoreSight Access Ports
//!
//! This adapter replaces probe-driven SWD/JTAG packet exchange with plain
//! reads and writes against a memory-mapped DAP window, for hosts that sit
//! on the same bus as the target's debug infrastructure (for example a Linux
//! core driving a microcontroller's APs through an interconnect).
//!
//! Two access modes coexist, routed by AP index:
//!
//! - **Direct**: the AP's registers really are memory mapped; register `r`
//!   of AP `n` lives at `base + n * stride + r`.
//! - **Emulated**: hardware only exposes a flat memory window, and the
//!   MEM-AP register protocol is synthesized in software.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod bus;
pub mod config;
pub mod error;
pub mod map;
pub mod regs;

mod emu;

pub use config::{DmemConfig, DEFAULT_DEVICE, MAX_EMULATED_APS};
pub use error::{DmemError, Result};

use log::error;

use emu::EmuState;
use map::{DevMemMapper, MmioMapper, MmioWindow};

/// Debug architecture revision of an AP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdiVersion {
    /// ADIv5, the only revision reachable through plain bus cycles
    V5,
    /// ADIv6, not supported by this adapter
    V6,
}

/// Address of one AP within the DAP
#[derive(Debug, Clone, Copy)]
pub struct ApAddress {
    /// AP index
    pub index: u64,
    /// Debug architecture revision
    pub version: AdiVersion,
}

impl ApAddress {
    /// An ADIv5 AP at `index`
    pub fn v5(index: u64) -> Self {
        Self {
            index,
            version: AdiVersion::V5,
        }
    }
}

/// The dmem DAP adapter
///
/// Owns the mapped windows and the queued-transaction error latch. The
/// queue operations mirror a packet-based DAP backend's interface, but every
/// access completes synchronously; `run` only reports the first error seen
/// since the last `run`.
pub struct DmemDap {
    config: DmemConfig,
    mapper: Box<dyn MmioMapper>,
    window: Option<Box<dyn MmioWindow>>,
    emu_window: Option<Box<dyn MmioWindow>>,
    emu: EmuState,
    latched: Option<DmemError>,
    adiv6_flagged: bool,
}

impl DmemDap {
    /// Adapter over `/dev/mem` (or the configured device path)
    pub fn new(config: DmemConfig) -> Self {
        Self::with_mapper(config, Box::new(DevMemMapper))
    }

    /// Adapter over an injected mapper; used by tests
    pub fn with_mapper(config: DmemConfig, mapper: Box<dyn MmioMapper>) -> Self {
        Self {
            config,
            mapper,
            window: None,
            emu_window: None,
            emu: EmuState::default(),
            latched: None,
            adiv6_flagged: false,
        }
    }

    /// Current configuration
    pub fn config(&self) -> &DmemConfig {
        &self.config
    }

    /// Map the AP register window, and the emulated window when any
    /// emulated APs are configured
    pub fn init(&mut self) -> Result<()> {
        if self.config.base_address == 0 {
            error!("dmem DAP base address NOT set? value is 0");
            return Err(DmemError::BaseAddressNotSet);
        }

        let window = self.mapper.map(
            &self.config.device,
            self.config.base_address,
            self.config.window_size(),
        )?;

        let emu_window = if self.config.emu_aps.is_empty() {
            None
        } else {
            let page = self.mapper.page_size() as u64;
            if self.config.emu_base % page != 0 || self.config.emu_size % page != 0 {
                // The first window unmaps on drop
                return Err(DmemError::AlignmentError {
                    addr: self.config.emu_base,
                    len: self.config.emu_size,
                    page: page as usize,
                });
            }
            Some(self.mapper.map(
                &self.config.device,
                self.config.emu_base,
                self.config.emu_size as usize,
            )?)
        };

        self.window = Some(window);
        self.emu_window = emu_window;
        Ok(())
    }

    /// Release both windows and close the device
    pub fn quit(&mut self) {
        self.window = None;
        self.emu_window = None;
    }

    /// Transport connect; nothing to negotiate on a memory bus
    pub fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    /// Adapter reset; the memory bus has no reset lines
    pub fn reset(&mut self, _trst: bool, _srst: bool) -> Result<()> {
        Ok(())
    }

    /// Speed is meaningless for direct memory access; accepted and ignored
    pub fn speed(&mut self, _speed: i32) -> Result<()> {
        Ok(())
    }

    /// Identity kHz mapping
    pub fn khz(&mut self, khz: i32) -> Result<i32> {
        Ok(khz)
    }

    /// Identity divisor mapping
    pub fn speed_div(&mut self, speed: i32) -> Result<i32> {
        Ok(speed)
    }

    /// Queue a DP register read
    ///
    /// The debug port is inert: CTRL_STAT always reads back as powered up,
    /// everything else reads as zero.
    pub fn queue_dp_read(&mut self, reg: u16, data: &mut u32) -> Result<()> {
        *data = match reg {
            regs::dp::CTRL_STAT => regs::dp::CDBGPWRUPACK | regs::dp::CSYSPWRUPACK,
            _ => 0,
        };
        Ok(())
    }

    /// Queue a DP register write; discarded
    pub fn queue_dp_write(&mut self, _reg: u16, _data: u32) -> Result<()> {
        Ok(())
    }

    /// Queue an AP register read
    pub fn queue_ap_read(&mut self, ap: &ApAddress, reg: u16, data: &mut u32) -> Result<()> {
        self.check_adiv5(ap)?;

        if self.config.is_emulated_ap(ap.index) {
            let window = self.emu_window.as_deref().ok_or(DmemError::NotInitialized)?;
            return match self.emu.read(window, reg) {
                Ok(val) => {
                    *data = val;
                    Ok(())
                }
                Err(err) => Err(self.latch(err)),
            };
        }

        let window = self.window.as_deref().ok_or(DmemError::NotInitialized)?;
        *data = window.read_u32(self.ap_reg_offset(ap, reg));
        Ok(())
    }

    /// Queue an AP register write
    pub fn queue_ap_write(&mut self, ap: &ApAddress, reg: u16, data: u32) -> Result<()> {
        self.check_adiv5(ap)?;

        if self.config.is_emulated_ap(ap.index) {
            let window = self.emu_window.as_deref().ok_or(DmemError::NotInitialized)?;
            return match self.emu.write(window, reg, data) {
                Ok(()) => Ok(()),
                Err(err) => Err(self.latch(err)),
            };
        }

        let window = self.window.as_deref().ok_or(DmemError::NotInitialized)?;
        window.write_u32(self.ap_reg_offset(ap, reg), data);
        Ok(())
    }

    /// Queue an abort; nothing can be in flight
    pub fn queue_ap_abort(&mut self) -> Result<()> {
        Ok(())
    }

    /// Complete the queued transaction: report and clear the first error
    /// seen since the previous run
    pub fn run(&mut self) -> Result<()> {
        match self.latched.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn ap_reg_offset(&self, ap: &ApAddress, reg: u16) -> usize {
        ap.index as usize * self.config.ap_stride as usize + reg as usize
    }

    fn check_adiv5(&mut self, ap: &ApAddress) -> Result<()> {
        if ap.version == AdiVersion::V6 {
            if !self.adiv6_flagged {
                error!("ADIv6 dap not supported by dmem dap-direct mode");
                self.adiv6_flagged = true;
            }
            return Err(DmemError::Adiv6Unsupported);
        }
        Ok(())
    }

    /// Record the first error of the transaction, pass the current one on
    fn latch(&mut self, err: DmemError) -> DmemError {
        if self.latched.is_none() {
            self.latched = Some(err.clone());
        }
        err
    }
}

impl Drop for DmemDap {
    fn drop(&mut self) {
        self.quit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::MmioWindow;
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    type SharedMem = Rc<RefCell<Vec<u8>>>;

    struct FakeWindow {
        mem: SharedMem,
        base: u64,
        len: usize,
    }

    impl MmioWindow for FakeWindow {
        fn read_u32(&self, offset: usize) -> u32 {
            let mem = self.mem.borrow();
            let at = self.base as usize + offset;
            u32::from_le_bytes(mem[at..at + 4].try_into().unwrap())
        }

        fn write_u32(&self, offset: usize, val: u32) {
            let mut mem = self.mem.borrow_mut();
            let at = self.base as usize + offset;
            mem[at..at + 4].copy_from_slice(&val.to_le_bytes());
        }

        fn len(&self) -> usize {
            self.len
        }
    }

    /// Mapper over one shared byte array addressed by physical address
    struct FakeMapper {
        mem: SharedMem,
    }

    impl MmioMapper for FakeMapper {
        fn page_size(&self) -> usize {
            0x1000
        }

        fn map(&self, _device: &Path, base: u64, len: usize) -> Result<Box<dyn MmioWindow>> {
            Ok(Box::new(FakeWindow {
                mem: Rc::clone(&self.mem),
                base,
                len,
            }))
        }
    }

    fn fake_dap(config: DmemConfig) -> (DmemDap, SharedMem) {
        let mem: SharedMem = Rc::new(RefCell::new(vec![0u8; 0x10000]));
        let dap = DmemDap::with_mapper(config, Box::new(FakeMapper { mem: Rc::clone(&mem) }));
        (dap, mem)
    }

    fn word_at(mem: &SharedMem, addr: usize) -> u32 {
        let mem = mem.borrow();
        u32::from_le_bytes(mem[addr..addr + 4].try_into().unwrap())
    }

    fn set_word(mem: &SharedMem, addr: usize, val: u32) {
        mem.borrow_mut()[addr..addr + 4].copy_from_slice(&val.to_le_bytes());
    }

    fn emulated_config() -> DmemConfig {
        let mut config = DmemConfig {
            base_address: 0x8000,
            ..Default::default()
        };
        config.set_emu_ap_list(&[1]).unwrap();
        config.emu_base = 0x1000;
        config.emu_size = 0x2000;
        config
    }

    #[test]
    fn init_requires_base_address() {
        let (mut dap, _mem) = fake_dap(DmemConfig::default());
        assert!(matches!(dap.init(), Err(DmemError::BaseAddressNotSet)));
    }

    #[test]
    fn init_rejects_unaligned_emulated_window() {
        let mut config = emulated_config();
        config.emu_base = 0x1080;
        let (mut dap, _mem) = fake_dap(config);
        assert!(matches!(dap.init(), Err(DmemError::AlignmentError { .. })));
    }

    #[test]
    fn direct_ap_registers_are_plain_memory() {
        let config = DmemConfig {
            base_address: 0x8000,
            max_aps: 2,
            ..Default::default()
        };
        let (mut dap, mem) = fake_dap(config);
        dap.init().unwrap();

        let ap1 = ApAddress::v5(1);
        dap.queue_ap_write(&ap1, regs::mem_ap::TAR, 0xdead_beef).unwrap();
        assert_eq!(word_at(&mem, 0x8000 + 0x100 + 0x04), 0xdead_beef);

        set_word(&mem, 0x8000 + 0x100 + 0x0c, 0x1234_5678);
        let mut val = 0;
        dap.queue_ap_read(&ap1, regs::mem_ap::DRW, &mut val).unwrap();
        assert_eq!(val, 0x1234_5678);
        dap.run().unwrap();
    }

    #[test]
    fn dp_reads_report_powered_up() {
        let (mut dap, _mem) = fake_dap(emulated_config());
        dap.init().unwrap();

        let mut val = 0;
        dap.queue_dp_read(regs::dp::CTRL_STAT, &mut val).unwrap();
        assert_eq!(val, 0xa000_0000);

        dap.queue_dp_read(0x8, &mut val).unwrap();
        assert_eq!(val, 0);

        dap.queue_dp_write(regs::dp::CTRL_STAT, 0xffff_ffff).unwrap();
        dap.run().unwrap();
    }

    #[test]
    fn emulated_drw_auto_increments_by_word() {
        let (mut dap, mem) = fake_dap(emulated_config());
        dap.init().unwrap();
        set_word(&mem, 0x2000, 0x11);
        set_word(&mem, 0x2004, 0x22);
        set_word(&mem, 0x2008, 0x33);

        let ap = ApAddress::v5(1);
        // Word size, auto-increment armed
        dap.queue_ap_write(&ap, regs::mem_ap::CSW, 0x22).unwrap();
        dap.queue_ap_write(&ap, regs::mem_ap::TAR, 0x1000).unwrap();

        let mut vals = [0u32; 3];
        for val in &mut vals {
            dap.queue_ap_read(&ap, regs::mem_ap::DRW, val).unwrap();
        }
        dap.run().unwrap();
        // emu window base is 0x1000, so TAR 0x1000 lands at physical 0x2000
        assert_eq!(vals, [0x11, 0x22, 0x33]);
    }

    #[test]
    fn emulated_drw_without_increment_stays_put() {
        let (mut dap, mem) = fake_dap(emulated_config());
        dap.init().unwrap();

        let ap = ApAddress::v5(1);
        dap.queue_ap_write(&ap, regs::mem_ap::CSW, 0x2).unwrap();
        dap.queue_ap_write(&ap, regs::mem_ap::TAR, 0x100).unwrap();
        dap.queue_ap_write(&ap, regs::mem_ap::DRW, 0xaa).unwrap();
        dap.queue_ap_write(&ap, regs::mem_ap::DRW, 0xbb).unwrap();
        dap.run().unwrap();
        assert_eq!(word_at(&mem, 0x1100), 0xbb);
    }

    #[test]
    fn emulated_tar_write_resets_increment() {
        let (mut dap, mem) = fake_dap(emulated_config());
        dap.init().unwrap();

        let ap = ApAddress::v5(1);
        dap.queue_ap_write(&ap, regs::mem_ap::CSW, 0x22).unwrap();
        dap.queue_ap_write(&ap, regs::mem_ap::TAR, 0x200).unwrap();
        dap.queue_ap_write(&ap, regs::mem_ap::DRW, 0x1).unwrap();
        dap.queue_ap_write(&ap, regs::mem_ap::DRW, 0x2).unwrap();
        // Rewriting TAR rewinds the cursor
        dap.queue_ap_write(&ap, regs::mem_ap::TAR, 0x200).unwrap();
        dap.queue_ap_write(&ap, regs::mem_ap::DRW, 0x3).unwrap();
        dap.run().unwrap();
        assert_eq!(word_at(&mem, 0x1200), 0x3);
        assert_eq!(word_at(&mem, 0x1204), 0x2);
    }

    #[test]
    fn emulated_bd_registers_window_off_tar() {
        let (mut dap, mem) = fake_dap(emulated_config());
        dap.init().unwrap();

        let ap = ApAddress::v5(1);
        // Low TAR bits are ignored for banked accesses
        dap.queue_ap_write(&ap, regs::mem_ap::TAR, 0x403).unwrap();
        dap.queue_ap_write(&ap, regs::mem_ap::BD2, 0xfeed).unwrap();
        assert_eq!(word_at(&mem, 0x1408), 0xfeed);

        set_word(&mem, 0x140c, 0xf00d);
        let mut val = 0;
        dap.queue_ap_read(&ap, regs::mem_ap::BD3, &mut val).unwrap();
        assert_eq!(val, 0xf00d);
        dap.run().unwrap();
    }

    #[test]
    fn emulated_address_marker_bit_is_masked() {
        let (mut dap, mem) = fake_dap(emulated_config());
        dap.init().unwrap();

        let ap = ApAddress::v5(1);
        dap.queue_ap_write(&ap, regs::mem_ap::TAR, 0x8000_0400).unwrap();
        dap.queue_ap_write(&ap, regs::mem_ap::DRW, 0x77).unwrap();
        dap.run().unwrap();
        assert_eq!(word_at(&mem, 0x1400), 0x77);
    }

    #[test]
    fn emulated_cfg_base_idr_read_as_zero() {
        let (mut dap, _mem) = fake_dap(emulated_config());
        dap.init().unwrap();

        let ap = ApAddress::v5(1);
        dap.queue_ap_write(&ap, regs::mem_ap::CFG, 0x1).unwrap();
        dap.queue_ap_write(&ap, regs::mem_ap::BASE, 0x2).unwrap();
        dap.queue_ap_write(&ap, regs::mem_ap::IDR, 0x3).unwrap();

        for reg in [regs::mem_ap::CFG, regs::mem_ap::BASE, regs::mem_ap::IDR] {
            let mut val = 0xffff_ffff;
            dap.queue_ap_read(&ap, reg, &mut val).unwrap();
            assert_eq!(val, 0);
        }
        dap.run().unwrap();
    }

    #[test]
    fn unknown_emulated_register_latches_until_run() {
        let (mut dap, _mem) = fake_dap(emulated_config());
        dap.init().unwrap();

        let ap = ApAddress::v5(1);
        let mut val = 0;
        assert!(matches!(
            dap.queue_ap_read(&ap, 0x40, &mut val),
            Err(DmemError::InvalidRegister(0x40))
        ));
        // Later successes do not clear the latch
        dap.queue_ap_write(&ap, regs::mem_ap::TAR, 0x0).unwrap();
        assert!(matches!(dap.run(), Err(DmemError::InvalidRegister(0x40))));
        // run() cleared it
        dap.run().unwrap();
    }

    #[test]
    fn adiv6_ap_is_rejected_without_latching() {
        let (mut dap, _mem) = fake_dap(emulated_config());
        dap.init().unwrap();

        let ap = ApAddress {
            index: 0,
            version: AdiVersion::V6,
        };
        let mut val = 0;
        for _ in 0..2 {
            assert!(matches!(
                dap.queue_ap_read(&ap, regs::mem_ap::CSW, &mut val),
                Err(DmemError::Adiv6Unsupported)
            ));
        }
        dap.run().unwrap();
    }

    #[test]
    fn quit_releases_the_windows() {
        let (mut dap, _mem) = fake_dap(emulated_config());
        dap.init().unwrap();
        dap.quit();

        let mut val = 0;
        assert!(matches!(
            dap.queue_ap_read(&ApAddress::v5(0), regs::mem_ap::CSW, &mut val),
            Err(DmemError::NotInitialized)
        ));
    }
}
