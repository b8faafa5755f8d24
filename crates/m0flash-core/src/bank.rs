//! Flash bank state and chip identification

use log::{debug, error, warn};

use crate::error::{Error, Result};
use crate::parts;
use crate::regs::{extract_field, factory, fctl};
use crate::target::TargetBus;

/// Recognized flash regions, keyed by bank base address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankKind {
    /// MAIN program flash at 0x0
    Main,
    /// NONMAIN configuration flash
    NonMain,
    /// DATA flash (not present on all parts)
    Data,
}

impl BankKind {
    /// MAIN region base address
    pub const MAIN_BASE: u32 = 0x0;
    /// NONMAIN region base address
    pub const NONMAIN_BASE: u32 = 0x41c0_0000;
    /// DATA region base address
    pub const DATA_BASE: u32 = 0x41d0_0000;

    /// Classify a bank base address
    pub fn from_base(base: u32) -> Result<Self> {
        match base {
            Self::MAIN_BASE => Ok(Self::Main),
            Self::NONMAIN_BASE => Ok(Self::NonMain),
            Self::DATA_BASE => Ok(Self::Data),
            other => Err(Error::InvalidBankBase(other)),
        }
    }

    /// The region's base address
    pub fn base(&self) -> u32 {
        match self {
            Self::Main => Self::MAIN_BASE,
            Self::NonMain => Self::NONMAIN_BASE,
            Self::Data => Self::DATA_BASE,
        }
    }
}

/// Three-valued per-sector status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tristate {
    /// Not yet determined
    #[default]
    Unknown,
    /// Determined false
    No,
    /// Determined true
    Yes,
}

impl From<bool> for Tristate {
    fn from(v: bool) -> Self {
        if v {
            Self::Yes
        } else {
            Self::No
        }
    }
}

/// One erase sector
#[derive(Debug, Clone, Copy)]
pub struct Sector {
    /// Offset from the bank base
    pub offset: u32,
    /// Size in bytes
    pub size: u32,
    /// Whether the sector reads back erased
    pub is_erased: Tristate,
    /// Whether the sector's protection bit is set
    pub is_protected: Tristate,
}

/// Identity data decoded by a successful probe
#[derive(Debug, Clone, Copy)]
pub struct DeviceInfo {
    /// Raw DID register value
    pub did: u32,
    /// Device unique ID
    pub trace_id: u32,
    /// Silicon revision, DID[31:28]
    pub version: u8,
    /// Chip name, or the family name when only the family matched
    pub name: &'static str,
    /// MAIN flash size in KiB
    pub main_flash_kib: u32,
    /// Number of hardware MAIN flash banks
    pub main_flash_banks: u32,
    /// DATA flash size in KiB
    pub data_flash_kib: u32,
    /// SRAM size in KiB
    pub sram_kib: u32,
}

/// Sector size shared by every MSPM0 flash region
pub const SECTOR_SIZE: u32 = 0x400;

/// NONMAIN region is a fixed single sector
const NONMAIN_SIZE: u32 = 512;

/// Protection registers cover at most 512 sectors per hardware bank
const MAX_SECTORS_PER_HW_BANK: u32 = 512;

/// A flash bank and its decoded geometry
///
/// Created against one of the three region base addresses, then hydrated by
/// [`FlashBank::probe`]. Erase, program, and protection operations live in
/// the `ops` and `protect` modules.
pub struct FlashBank {
    pub(crate) kind: BankKind,
    pub(crate) size: u32,
    pub(crate) sector_size: u32,
    /// Flash word size: 64-bit = 8 bytes, 128-bit = 16 bytes
    pub(crate) flash_word_size: u32,
    pub(crate) protect_reg_base: u32,
    pub(crate) protect_reg_count: u32,
    pub(crate) device: Option<DeviceInfo>,
    pub(crate) sectors: Vec<Sector>,
}

impl FlashBank {
    /// Declare a bank at one of the recognized region base addresses
    pub fn new(base: u32) -> Result<Self> {
        Ok(Self {
            kind: BankKind::from_base(base)?,
            size: 0,
            sector_size: SECTOR_SIZE,
            flash_word_size: 8,
            protect_reg_base: 0,
            protect_reg_count: 0,
            device: None,
            sectors: Vec::new(),
        })
    }

    /// The region this bank covers
    pub fn kind(&self) -> BankKind {
        self.kind
    }

    /// Bank size in bytes; zero until probed
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Sector states, empty until probed
    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    /// Number of sectors
    pub fn num_sectors(&self) -> u32 {
        self.sectors.len() as u32
    }

    /// Smallest programmable unit in bytes
    pub fn flash_word_size(&self) -> u32 {
        self.flash_word_size
    }

    /// Identity data, or `NotProbed`
    pub fn device(&self) -> Result<&DeviceInfo> {
        self.device.as_ref().ok_or(Error::NotProbed)
    }

    /// Whether a probe has succeeded on this bank
    pub fn is_probed(&self) -> bool {
        self.device.is_some()
    }

    /// Identify the chip and compute the bank geometry
    ///
    /// Cheap after the first successful call. Does not require a halted
    /// target; nothing is written.
    pub fn probe(&mut self, bus: &mut dyn TargetBus) -> Result<()> {
        if self.is_probed() {
            return Ok(());
        }

        let info = read_part_info(bus)?;
        match self.kind {
            BankKind::NonMain => {
                self.size = NONMAIN_SIZE;
                self.protect_reg_base = fctl::CMDWEPROTNM;
                self.protect_reg_count = 1;
            }
            BankKind::Main => {
                let per_hw_bank = info.main_flash_kib / info.main_flash_banks;
                if per_hw_bank > MAX_SECTORS_PER_HW_BANK {
                    error!(
                        "{}: {} sectors per hardware bank exceeds the protection scheme",
                        info.name, per_hw_bank
                    );
                    return Err(Error::ProbeFailed);
                }
                self.size = info.main_flash_kib * 1024;
                self.protect_reg_base = fctl::CMDWEPROTA;
                self.protect_reg_count = 3;
            }
            BankKind::Data => {
                if info.data_flash_kib == 0 {
                    error!("{}: Data region NOT available!", info.name);
                    self.size = 0;
                    self.sectors.clear();
                    self.device = Some(info);
                    return Ok(());
                }
                self.size = info.main_flash_kib * 1024;
            }
        }

        // NONMAIN is smaller than one full sector but still erases as one
        let (num_sectors, sector_size) = if self.kind == BankKind::NonMain {
            (1, self.size)
        } else {
            (self.size / self.sector_size, self.sector_size)
        };
        self.sectors = (0..num_sectors)
            .map(|i| Sector {
                offset: i * sector_size,
                size: sector_size,
                is_erased: Tristate::Unknown,
                is_protected: Tristate::Unknown,
            })
            .collect();
        self.device = Some(info);

        Ok(())
    }

    /// Human summary of the probed chip
    pub fn info(&self) -> Result<String> {
        let dev = self.device()?;
        Ok(format!(
            "TI MSPM0 information: Chip is {} rev {} Device Unique ID: {}\n\
             main flash: {}KiB in {} bank(s), sram: {}KiB, data flash: {}KiB",
            dev.name,
            dev.version,
            dev.trace_id,
            dev.main_flash_kib,
            dev.main_flash_banks,
            dev.sram_kib,
            dev.data_flash_kib
        ))
    }
}

/// Read and decode the factory identity registers
fn read_part_info(bus: &mut dyn TargetBus) -> Result<DeviceInfo> {
    let did = bus.read_u32(factory::DID)?;
    let trace_id = bus.read_u32(factory::TRACEID)?;
    let userid = bus.read_u32(factory::USERID)?;
    let sramflash = bus.read_u32(factory::SRAMFLASH)?;

    let version = extract_field(did, 31, 28) as u8;
    let part_num = extract_field(did, 27, 12) as u16;
    let variant = extract_field(userid, 23, 16) as u8;
    let part = extract_field(userid, 15, 0) as u16;

    // DID bit 0 is an ALWAYS_1 marker on valid silicon
    if did & 1 == 0 {
        warn!("Unknown Device ID[{did:#x}], cannot identify target");
        debug!("did {did:#x}, traceid {trace_id:#x}, userid {userid:#x}, sramflash {sramflash:#x}");
        return Err(Error::ProbeFailed);
    }

    let family = match parts::find_family(part_num) {
        Some(f) => f,
        None => {
            warn!("Unsupported DeviceID[{part_num:#x}], cannot identify target");
            debug!(
                "did {did:#x}, traceid {trace_id:#x}, userid {userid:#x}, sramflash {sramflash:#x}"
            );
            return Err(Error::ProbeFailed);
        }
    };

    let name = match family.find_part(part, variant) {
        Some(p) => {
            debug!("Part: {} detected", p.name);
            p.name
        }
        None => {
            warn!(
                "Unidentified PART[{part:#x}]/variant[{variant:#x}], known \
                 DeviceID[{part_num:#x}]. Attempting to proceed as {}.",
                family.name
            );
            family.name
        }
    };

    let info = DeviceInfo {
        did,
        trace_id,
        version,
        name,
        main_flash_kib: extract_field(sramflash, 11, 0),
        main_flash_banks: extract_field(sramflash, 13, 12) + 1,
        data_flash_kib: extract_field(sramflash, 31, 26),
        sram_kib: extract_field(sramflash, 25, 16),
    };

    debug!(
        "Detected: main flash: {}KiB in {} banks, sram: {}KiB, data flash: {}KiB",
        info.main_flash_kib, info.main_flash_banks, info.sram_kib, info.data_flash_kib
    );

    Ok(info)
}
