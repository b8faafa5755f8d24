//! Target memory access through a MEM-AP
//!
//! Adapts a [`DmemDap`] AP into the flash core's [`TargetBus`], one
//! CSW/TAR/DRW sequence per word. Auto-increment is left off; the flash
//! driver's access pattern is register-heavy rather than streaming.

use log::error;
use m0flash_core::{Error as CoreError, TargetBus};

use crate::regs::{mem_ap, CSW_32BIT_NOINC};
use crate::{ApAddress, DmemDap, DmemError};

/// [`TargetBus`] implementation over one MEM-AP of a [`DmemDap`]
pub struct MemApBus {
    dap: DmemDap,
    ap: ApAddress,
    halted: bool,
}

impl MemApBus {
    /// Wrap an initialized DAP, addressing the target through `ap_index`
    ///
    /// `assume_halted` reflects that this transport has no run-control; the
    /// caller asserts the core's halt state out of band.
    pub fn new(dap: DmemDap, ap_index: u64, assume_halted: bool) -> Self {
        Self {
            dap,
            ap: ApAddress::v5(ap_index),
            halted: assume_halted,
        }
    }

    /// The wrapped adapter
    pub fn dap(&self) -> &DmemDap {
        &self.dap
    }

    /// The wrapped adapter, mutable
    pub fn dap_mut(&mut self) -> &mut DmemDap {
        &mut self.dap
    }

    fn stage_address(&mut self, addr: u32) -> Result<(), DmemError> {
        self.dap
            .queue_ap_write(&self.ap, mem_ap::CSW, CSW_32BIT_NOINC)?;
        self.dap.queue_ap_write(&self.ap, mem_ap::TAR, addr)
    }
}

fn bus_err(err: DmemError) -> CoreError {
    error!("dmem target access failed: {err}");
    CoreError::Bus
}

impl TargetBus for MemApBus {
    fn read_u32(&mut self, addr: u32) -> m0flash_core::Result<u32> {
        let mut val = 0;
        self.stage_address(addr)
            .and_then(|()| self.dap.queue_ap_read(&self.ap, mem_ap::DRW, &mut val))
            .and_then(|()| self.dap.run())
            .map_err(bus_err)?;
        Ok(val)
    }

    fn write_u32(&mut self, addr: u32, val: u32) -> m0flash_core::Result<()> {
        self.stage_address(addr)
            .and_then(|()| self.dap.queue_ap_write(&self.ap, mem_ap::DRW, val))
            .and_then(|()| self.dap.run())
            .map_err(bus_err)
    }

    fn is_halted(&mut self) -> m0flash_core::Result<bool> {
        Ok(self.halted)
    }
}
