//! Adapter configuration

use std::fmt;
use std::path::PathBuf;

use crate::error::{DmemError, Result};

/// Default backing memory device
pub const DEFAULT_DEVICE: &str = "/dev/mem";

/// Upper bound on emulated AP indices
pub const MAX_EMULATED_APS: usize = 5;

/// dmem adapter configuration
///
/// Collected before `init`; the DAP base address is the only mandatory
/// field.
#[derive(Debug, Clone)]
pub struct DmemConfig {
    /// Memory access device path
    pub device: PathBuf,
    /// Physical base address of the AP register window
    pub base_address: u64,
    /// Stride between consecutive AP register windows
    pub ap_stride: u32,
    /// Number of APs the mapping must cover
    pub max_aps: u8,
    /// AP indices whose registers are emulated rather than mapped
    pub emu_aps: Vec<u64>,
    /// Physical base of the emulated memory window, page aligned
    pub emu_base: u64,
    /// Size of the emulated memory window, page aligned
    pub emu_size: u64,
}

impl Default for DmemConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from(DEFAULT_DEVICE),
            base_address: 0,
            ap_stride: 0x100,
            max_aps: 1,
            emu_aps: Vec::new(),
            emu_base: 0,
            emu_size: 0,
        }
    }
}

impl DmemConfig {
    /// Replace the emulated AP index list
    pub fn set_emu_ap_list(&mut self, list: &[u64]) -> Result<()> {
        if list.len() > MAX_EMULATED_APS {
            return Err(DmemError::TooManyEmulatedAps(list.len()));
        }
        self.emu_aps = list.to_vec();
        Ok(())
    }

    /// Whether an AP index is routed through the emulation layer
    pub fn is_emulated_ap(&self, ap_index: u64) -> bool {
        self.emu_aps.contains(&ap_index)
    }

    /// Total size of the direct AP register window
    pub(crate) fn window_size(&self) -> usize {
        (self.max_aps as usize + 1) * self.ap_stride as usize
    }
}

impl fmt::Display for DmemConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "dmem (Direct Memory) AP Adapter Configuration:")?;
        writeln!(f, " Device       : {}", self.device.display())?;
        writeln!(f, " Base Address : {:#x}", self.base_address)?;
        writeln!(f, " Max APs      : {}", self.max_aps)?;
        writeln!(f, " AP offset    : {:#010x}", self.ap_stride)?;
        write!(f, " Emulated AP Count : {}", self.emu_aps.len())?;
        if !self.emu_aps.is_empty() {
            writeln!(f)?;
            writeln!(f, " Emulated AP details:")?;
            writeln!(f, " Emulated address  : {:#x}", self.emu_base)?;
            write!(f, " Emulated size     : {:#x}", self.emu_size)?;
            for (i, ap) in self.emu_aps.iter().enumerate() {
                write!(f, "\n Emulated AP [{i}]  : {ap}")?;
            }
        }
        Ok(())
    }
}
