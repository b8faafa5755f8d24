//! m0flash - flash tool for TI MSPM0 microcontrollers
//!
//! Talks to the target's debug infrastructure through memory-mapped
//! CoreSight Access Ports (the dmem adapter) instead of an external debug
//! probe, then drives the on-chip flash controller to identify, erase,
//! program, and write-protect the MAIN/NONMAIN/DATA flash regions.

mod adapter;
mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands, DmemCommands};

fn main() {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    // The dmem subtree only inspects configuration; no mapping is set up
    if let Commands::Dmem { command } = &cli.command {
        let params = adapter::parse_adapter_params(&cli.adapter)?;
        if params.name != "dmem" {
            return Err(format!("Unknown adapter: {}", params.name).into());
        }
        match command {
            DmemCommands::Info => println!("{}", adapter::dmem_config(&params)?),
        }
        return Ok(());
    }

    let mut bus = adapter::open_adapter(&cli.adapter)?;

    match cli.command {
        Commands::Probe { bank } => commands::probe::run(&mut bus, bank.base()),
        Commands::Info { bank } => commands::info::run(&mut bus, bank.base()),
        Commands::Erase { bank, first, last } => {
            commands::erase::run(&mut bus, bank.base(), first, last)
        }
        Commands::Write {
            bank,
            offset,
            input,
        } => commands::write::run(&mut bus, bank.base(), offset, &input),
        Commands::Read {
            bank,
            offset,
            length,
            output,
        } => commands::read::run(&mut bus, bank.base(), offset, length, &output),
        Commands::Protect { bank, first, last } => {
            commands::protect::run(&mut bus, bank.base(), true, first, last)
        }
        Commands::Unprotect { bank, first, last } => {
            commands::protect::run(&mut bus, bank.base(), false, first, last)
        }
        Commands::Status { bank } => commands::status::run(&mut bus, bank.base()),
        Commands::Dmem { .. } => unreachable!("handled above"),
    }
}
