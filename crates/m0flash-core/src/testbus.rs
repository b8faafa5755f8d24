//! In-memory target bus fake for driver tests

use std::collections::HashMap;

use crate::error::Result;
use crate::regs::{factory, fctl};
use crate::target::TargetBus;

/// Register/memory-backed [`TargetBus`] that records every write.
pub struct FakeTarget {
    mem: HashMap<u32, u32>,
    /// Every write in issue order
    pub writes: Vec<(u32, u32)>,
    halted: bool,
    reads: usize,
}

impl FakeTarget {
    /// Empty target, halted, STATCMD reporting instant pass
    pub fn new() -> Self {
        let mut t = Self {
            mem: HashMap::new(),
            writes: Vec::new(),
            halted: true,
            reads: 0,
        };
        t.set(fctl::STATCMD, 0x3); // CMDDONE | CMDPASS
        t
    }

    /// Target presenting MSPM0G3507SRGZR identity registers
    ///
    /// 128 KiB main flash in 2 banks, 32 KiB SRAM, no data flash.
    pub fn mspm0g3507() -> Self {
        let mut t = Self::new();
        t.set(factory::DID, (0x1 << 28) | (0xbb88 << 12) | 1);
        t.set(factory::TRACEID, 0x2a);
        t.set(factory::USERID, (0xf7 << 16) | 0xae2d);
        t.set(factory::SRAMFLASH, (32 << 16) | (1 << 12) | 128);
        t
    }

    /// Set a register or memory word
    pub fn set(&mut self, addr: u32, val: u32) {
        self.mem.insert(addr, val);
    }

    /// Current value of a register or memory word
    pub fn get(&self, addr: u32) -> u32 {
        self.mem.get(&addr).copied().unwrap_or(0)
    }

    /// Mark the core halted or running
    pub fn set_halted(&mut self, halted: bool) {
        self.halted = halted;
    }

    /// Number of reads issued so far
    pub fn read_count(&self) -> usize {
        self.reads
    }

    /// Values written to one address, in order
    pub fn writes_to(&self, addr: u32) -> Vec<u32> {
        self.writes
            .iter()
            .filter(|(a, _)| *a == addr)
            .map(|(_, v)| *v)
            .collect()
    }
}

impl Default for FakeTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetBus for FakeTarget {
    fn read_u32(&mut self, addr: u32) -> Result<u32> {
        self.reads += 1;
        Ok(self.get(addr))
    }

    fn write_u32(&mut self, addr: u32, val: u32) -> Result<()> {
        self.writes.push((addr, val));
        self.mem.insert(addr, val);
        Ok(())
    }

    fn is_halted(&mut self) -> Result<bool> {
        Ok(self.halted)
    }
}
