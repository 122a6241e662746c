//! Build a demonstration scan sequence and print its dump.
//!
//! Useful for eyeballing the addressing of nested programs:
//! ```bash
//! RUST_LOG=debug cargo run --bin sequence_dump -- --start 0 --end 10 --step 2
//! ```

use anyhow::Result;
use clap::Parser;
use scan_commands::{CommandSequence, ScanCommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "sequence_dump",
    about = "Build a demonstration scan sequence and print its dump"
)]
struct Args {
    /// Device stepped by the scan loop
    #[arg(long, default_value = "setpoint")]
    device: String,

    /// Readback device waited on and logged
    #[arg(long, default_value = "readback")]
    readback: String,

    /// First loop value
    #[arg(long, default_value_t = 1.0)]
    start: f64,

    /// Last loop value (inclusive)
    #[arg(long, default_value_t = 5.0)]
    end: f64,

    /// Loop increment
    #[arg(long, default_value_t = 1.0)]
    step: f64,
}

fn main() -> Result<()> {
    // Initialize tracing with RUST_LOG env var
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut seq = CommandSequence::new();
    seq.set(args.device.as_str(), args.start);
    seq.wait_for(args.readback.as_str(), args.start, 0.1)?;
    seq.loop_over(
        args.device.as_str(),
        args.start,
        args.end,
        args.step,
        [ScanCommand::log([args.readback.as_str()])],
    )?;
    seq.log([args.readback.as_str()]);

    print!("{}", seq.dump());
    Ok(())
}
