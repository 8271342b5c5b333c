use clap::Parser;
use egb_core::{EmulatorError, RunConfig};
use std::process::ExitCode;

/// Emulator for the original monochrome handheld and its color successor.
#[derive(Parser)]
#[command(name = "egb")]
struct Cli {
    /// Path to the cartridge ROM
    rom_path: String,

    /// Enable the debug overlay
    #[arg(short = 'd')]
    debug: bool,

    /// Trace every executed instruction
    #[arg(short = 'v')]
    verbose: bool,

    /// Report the measured emulation speed once per second
    #[arg(short = 's')]
    speed: bool,

    /// Run at uncapped speed
    #[arg(long)]
    fast: bool,

    /// Add a PC breakpoint (hex address); may be repeated
    #[arg(short = 'b', value_name = "HEX", value_parser = parse_breakpoint)]
    breakpoints: Vec<u16>,

    /// Disable audio output
    #[arg(long = "no-audio", default_value_t = true, action = clap::ArgAction::SetFalse)]
    audio_enabled: bool,
}

fn parse_breakpoint(s: &str) -> Result<u16, String> {
    let s = s.trim_start_matches("0x");
    u16::from_str_radix(s, 16).map_err(|err| format!("invalid breakpoint address '{s}': {err}"))
}

fn main() -> ExitCode {
    let args = Cli::parse();

    let default_filter = if args.verbose { "trace" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let run_config = RunConfig {
        debug_overlay: args.debug,
        verbose_trace: args.verbose,
        speed_report: args.speed,
        uncapped_speed: args.fast,
        breakpoints: args.breakpoints,
        audio_enabled: args.audio_enabled,
        ..RunConfig::new(args.rom_path)
    };

    match egb_core::run(&run_config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err @ EmulatorError::Load(_)) => {
            log::error!("{err}");
            ExitCode::from(2)
        }
        Err(err) => {
            log::error!("{err}");
            ExitCode::from(1)
        }
    }
}
