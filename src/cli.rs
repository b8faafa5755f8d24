//! CLI argument parsing

use clap::{Parser, Subcommand, ValueEnum};
use m0flash_core::BankKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "m0flash")]
#[command(author, version, about = "TI MSPM0 flash tool over a direct-memory debug port", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Adapter to use, e.g. "dmem:base=0x4002000" or
    /// "dmem:base=0x4002000,emu-aps=1,emu-base=0x760000000,emu-size=0x1000"
    #[arg(short, long, global = true, default_value = "dmem")]
    pub adapter: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flash bank selection
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BankArg {
    /// MAIN program flash
    Main,
    /// NONMAIN configuration flash
    Nonmain,
    /// DATA flash
    Data,
}

impl BankArg {
    pub fn base(self) -> u32 {
        match self {
            Self::Main => BankKind::MAIN_BASE,
            Self::Nonmain => BankKind::NONMAIN_BASE,
            Self::Data => BankKind::DATA_BASE,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Identify the chip and print its flash geometry
    Probe {
        /// Flash bank
        #[arg(short, long, value_enum, default_value = "main")]
        bank: BankArg,
    },

    /// Print chip information
    Info {
        /// Flash bank
        #[arg(short, long, value_enum, default_value = "main")]
        bank: BankArg,
    },

    /// Erase a range of sectors
    Erase {
        /// Flash bank
        #[arg(short, long, value_enum, default_value = "main")]
        bank: BankArg,

        /// First sector to erase
        #[arg(long, default_value_t = 0)]
        first: u32,

        /// One past the last sector to erase; defaults to the whole bank
        #[arg(long)]
        last: Option<u32>,
    },

    /// Program a file into flash
    Write {
        /// Flash bank
        #[arg(short, long, value_enum, default_value = "main")]
        bank: BankArg,

        /// Byte offset within the bank, flash-word aligned
        #[arg(long, value_parser = parse_num, default_value = "0")]
        offset: u32,

        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Read flash contents to file
    Read {
        /// Flash bank
        #[arg(short, long, value_enum, default_value = "main")]
        bank: BankArg,

        /// Byte offset within the bank
        #[arg(long, value_parser = parse_num, default_value = "0")]
        offset: u32,

        /// Number of bytes; defaults to the rest of the bank
        #[arg(long, value_parser = parse_num)]
        length: Option<u32>,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write-protect a range of sectors
    Protect {
        /// Flash bank
        #[arg(short, long, value_enum, default_value = "main")]
        bank: BankArg,

        /// First sector to protect
        #[arg(long)]
        first: u32,

        /// One past the last sector to protect
        #[arg(long)]
        last: u32,
    },

    /// Remove write protection from a range of sectors
    Unprotect {
        /// Flash bank
        #[arg(short, long, value_enum, default_value = "main")]
        bank: BankArg,

        /// First sector to unprotect
        #[arg(long)]
        first: u32,

        /// One past the last sector to unprotect
        #[arg(long)]
        last: u32,
    },

    /// Show per-sector protection and blank state
    Status {
        /// Flash bank
        #[arg(short, long, value_enum, default_value = "main")]
        bank: BankArg,
    },

    /// Adapter management
    Dmem {
        #[command(subcommand)]
        command: DmemCommands,
    },
}

#[derive(Subcommand)]
pub enum DmemCommands {
    /// Print the adapter configuration
    Info,
}

/// Parse a decimal or 0x-prefixed hex number
pub fn parse_num(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid number '{s}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_num_accepts_hex_and_decimal() {
        assert_eq!(parse_num("0x400").unwrap(), 0x400);
        assert_eq!(parse_num("1024").unwrap(), 1024);
        assert!(parse_num("0xzz").is_err());
    }
}
