use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use cadence_controllers::cpm::{TPA, install_cpm_stubs};
use cadence_controllers::{MemoryController, registry};
use cadence_core::prelude::{Compressor, Machine, Options, share};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod config;
mod program_path;

use config::Config;

/// Run an Intel 8080 program.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Program image: a raw file, `archive.zip`, or `archive.zip:NAME`
    #[arg(value_name = "PROGRAM", required_unless_present = "list_controllers")]
    program: Option<String>,

    /// Address the program is loaded at
    #[arg(long, value_parser = parse_address)]
    load_address: Option<u16>,

    /// Entry point (defaults to the load address)
    #[arg(long, value_parser = parse_address)]
    start: Option<u16>,

    /// Stop when PC reaches this address
    #[arg(long, value_parser = parse_address)]
    exit_address: Option<u16>,

    /// I/O controller name (see --list-controllers)
    #[arg(long)]
    controller: Option<String>,

    /// Emulated nanoseconds between syncs with real time; negative runs unpaced
    #[arg(long, allow_hyphen_values = true)]
    clock_resolution: Option<i64>,

    /// Interrupt polls every ISR_FREQ * resolution cycles
    #[arg(long)]
    isr_freq: Option<f64>,

    /// Store snapshot memory without compression
    #[arg(long)]
    uncompressed: bool,

    /// Settings file (defaults to <config dir>/cadence/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Restore this snapshot and resume instead of starting at --start
    #[arg(long)]
    load_state: Option<PathBuf>,

    /// Write a snapshot here when the run ends
    #[arg(long)]
    save_state: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// List available I/O controllers and exit
    #[arg(long)]
    list_controllers: bool,
}

fn parse_address(s: &str) -> Result<u16, String> {
    let hex = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .or_else(|| s.strip_suffix(['h', 'H']));
    let parsed = match hex {
        Some(digits) => u16::from_str_radix(digits, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address {s:?}: {e}"))
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "cadence=warn",
        1 => "cadence=debug",
        _ => "cadence=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    if args.list_controllers {
        for entry in registry::all() {
            println!("{:<8} {}", entry.name, entry.description);
        }
        return Ok(());
    }

    let config = Config::load(args.config.as_deref())?;
    let controller_name = args
        .controller
        .or(config.controller)
        .unwrap_or_else(|| "cpm".to_string());
    let entry = registry::find(&controller_name).ok_or_else(|| {
        let names: Vec<_> = registry::all().iter().map(|e| e.name).collect();
        format!(
            "unknown controller {controller_name:?} (available: {})",
            names.join(", ")
        )
    })?;

    let program_arg = args.program.ok_or("PROGRAM is required")?;
    let program = program_path::load_program(&program_arg)?;
    let load_address = args.load_address.or(config.load_address).unwrap_or(TPA);

    let mut memory = MemoryController::new();
    if entry.name == "cpm" {
        install_cpm_stubs(&mut memory);
    }
    memory.load_bytes(load_address, &program)?;
    tracing::debug!(
        program = %program_arg,
        len = program.len(),
        load_address,
        controller = entry.name,
        "program loaded"
    );

    let mut options = Options::default();
    if let Some(resolution) = args.clock_resolution.or(config.clock_resolution) {
        options.clock_resolution = resolution;
    }
    if let Some(isr_freq) = args.isr_freq.or(config.isr_freq) {
        options.isr_freq = isr_freq;
    }
    options.exit_address = args.exit_address.or(config.exit_address);
    if args.uncompressed {
        options.compressor = Compressor::Stored;
    } else if let Some(compressor) = config.compressor {
        options.compressor = compressor;
    }

    let mut machine = Machine::new();
    machine.set_options(Some(&options.to_json()?))?;
    machine.set_memory_controller(Some(share(memory).1))?;
    machine.set_io_controller(Some((entry.create)()))?;

    let elapsed_ns = match &args.load_state {
        Some(path) => {
            machine.load(&std::fs::read_to_string(path)?)?;
            machine.resume()?
        }
        None => machine.run(args.start.unwrap_or(load_address))?,
    };
    std::io::stdout().flush()?;

    let stats = machine.stats()?;
    let state = machine.cpu_state()?;
    eprintln!();
    eprintln!(
        "Stopped at PC={:04X} after {} instructions ({} cycles) in {:.3?}",
        state.pc,
        stats.instructions,
        stats.cycles,
        Duration::from_nanos(elapsed_ns)
    );
    if options.clock_resolution > 0 {
        eprintln!("Drift: {:.3?}", stats.drift);
    }

    if let Some(path) = &args.save_state {
        std::fs::write(path, machine.save()?)?;
        eprintln!("Snapshot written to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_addresses() {
        assert_eq!(parse_address("256"), Ok(0x0100));
        assert_eq!(parse_address("0x0100"), Ok(0x0100));
        assert_eq!(parse_address("FF00h"), Ok(0xFF00));
        assert!(parse_address("0x10000").is_err());
        assert!(parse_address("start").is_err());
    }

    #[test]
    fn cli_overrides_defaults() {
        let args = Args::try_parse_from([
            "cadence",
            "prog.com",
            "--load-address",
            "0x0000",
            "--clock-resolution",
            "-1",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.program.as_deref(), Some("prog.com"));
        assert_eq!(args.load_address, Some(0));
        assert_eq!(args.clock_resolution, Some(-1));
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn list_controllers_needs_no_program() {
        let args = Args::try_parse_from(["cadence", "--list-controllers"]).unwrap();
        assert!(args.list_controllers);
        assert!(args.program.is_none());
    }
}
