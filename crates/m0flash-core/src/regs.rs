//! MSPM0 register map: factory identity region and flash controller (FCTL)

use bitflags::bitflags;

/// FACTORYREGION identity registers
pub mod factory {
    /// Factory region base address
    pub const BASE: u32 = 0x41c4_0000;
    /// Device unique ID
    pub const TRACEID: u32 = BASE;
    /// Chip identification register
    pub const DID: u32 = BASE + 0x04;
    /// Part/variant identification register
    pub const USERID: u32 = BASE + 0x08;
    /// SRAM and flash geometry register
    pub const SRAMFLASH: u32 = BASE + 0x18;
}

/// Flash controller (FCTL) registers
pub mod fctl {
    /// Flash controller base address
    pub const BASE: u32 = 0x400c_d000;
    /// Command execute trigger
    pub const CMDEXEC: u32 = BASE + 0x1100;
    /// Command type (operation and size)
    pub const CMDTYPE: u32 = BASE + 0x1104;
    /// Command target address
    pub const CMDADDR: u32 = BASE + 0x1120;
    /// Per-byte and ECC-chunk enables for program commands
    pub const CMDBYTEN: u32 = BASE + 0x1124;
    /// First command data register; data registers are consecutive words
    pub const CMDDATA0: u32 = BASE + 0x1130;
    /// MAIN region write/erase protection, 3 consecutive registers
    pub const CMDWEPROTA: u32 = BASE + 0x11d0;
    /// NONMAIN region write/erase protection
    pub const CMDWEPROTNM: u32 = BASE + 0x1210;
    /// Command status
    pub const STATCMD: u32 = BASE + 0x13d0;

    /// CMDEXEC[VAL]: start the staged command
    pub const CMDEXEC_EXECUTE: u32 = 0x1;

    /// CMDTYPE[COMMAND]: program
    pub const CMDTYPE_COMMAND_PROGRAM: u32 = 0x1;
    /// CMDTYPE[COMMAND]: erase
    pub const CMDTYPE_COMMAND_ERASE: u32 = 0x2;
    /// CMDTYPE[SIZE]: one flash word
    pub const CMDTYPE_SIZE_ONEWORD: u32 = 0x00;
    /// CMDTYPE[SIZE]: one sector
    pub const CMDTYPE_SIZE_SECTOR: u32 = 0x40;
}

bitflags! {
    /// FCTL STATCMD register bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatCmd: u32 {
        /// Command completed
        const CMDDONE       = 1 << 0;
        /// Command passed
        const CMDPASS       = 1 << 1;
        /// Command still in progress
        const CMDINPROGRESS = 1 << 2;
        /// Write/erase blocked by protection
        const FAILWEPROT    = 1 << 4;
        /// Post-operation verify failed
        const FAILVERIFY    = 1 << 5;
        /// Command address outside the addressed region
        const FAILILLADDR   = 1 << 6;
        /// Flash controller in an illegal mode for the command
        const FAILMODE      = 1 << 7;
        /// Miscellaneous failure
        const FAILMISC      = 1 << 12;
    }
}

impl StatCmd {
    const FAIL_NAMES: [(StatCmd, &'static str); 6] = [
        (StatCmd::CMDINPROGRESS, "CMDINPROGRESS"),
        (StatCmd::FAILWEPROT, "FAILWEPROT"),
        (StatCmd::FAILVERIFY, "FAILVERIFY"),
        (StatCmd::FAILILLADDR, "FAILILLADDR"),
        (StatCmd::FAILMODE, "FAILMODE"),
        (StatCmd::FAILMISC, "FAILMISC"),
    ];

    /// Render the failure bits of a status word as a space-separated list
    pub fn describe(&self) -> String {
        let names: Vec<&str> = Self::FAIL_NAMES
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, name)| *name)
            .collect();
        if names.is_empty() {
            format!("{:#x}", self.bits())
        } else {
            names.join(" ")
        }
    }
}

/// Extract the bit field `[hi:lo]` of a register value
pub(crate) fn extract_field(val: u32, hi: u8, lo: u8) -> u32 {
    debug_assert!(hi >= lo && hi < 32);
    (val >> lo) & (u32::MAX >> (31 - (hi - lo)))
}
