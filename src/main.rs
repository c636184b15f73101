//! Rotalock CLI
//!
//! Usage:
//!   rotalock --serve                        # HTTP + WebSocket API server
//!   rotalock --stdin                        # Live bridge: angles from stdin
//!   rotalock --stdin --raw-adc              # Live bridge: raw 16-bit ADC samples from stdin
//!   rotalock --replay script.txt            # Deterministic replay of `<t_ms> <angle>` lines
//!   rotalock --replay script.txt --json     # JSON output

use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rotalock::core::{
    parse_script, run_script, run_server, LineDecoder, MemorySink, RotaryLockEvaluator,
    SystemClock,
};
use rotalock::types::{format_sequence, AuthOutcome, AuthStatus, StateOutput};
use rotalock::{LockConfig, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "rotalock",
    version = VERSION,
    about = "Rotary color-sequence lock - hold the dial on each color to enter the password",
    long_about = "Rotalock turns rotary sensor angles into a color sequence.\n\n\
                  The dial is split into six 60° quadrants:\n  \
                  red [330, 30)  blue [30, 90)  green [90, 150)\n  \
                  yellow [150, 210)  purple [210, 270)  orange [270, 330)\n\n\
                  Hold the pointer in one quadrant for the dwell time to confirm\n\
                  its color. Once the sequence is full it is judged against the\n\
                  stored password and the lock resets after a short cool-down.\n\n\
                  Modes:\n  \
                  --serve   HTTP + WebSocket API server\n  \
                  --stdin   Read sensor lines (\"Angle: 123 degrees\") from stdin\n  \
                  --raw-adc With --stdin, read raw ADC samples and smooth them\n  \
                  --replay  Run a timestamped script on a simulated clock"
)]
struct Args {
    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Read angle lines from stdin in real time
    #[arg(long, conflicts_with_all = ["replay", "serve"])]
    stdin: bool,

    /// Stdin lines are raw 16-bit ADC samples (`Angle: 40000 (raw), 61.0%`)
    #[arg(long, conflicts_with_all = ["replay", "serve"])]
    raw_adc: bool,

    /// Replay a `<t_ms> <angle>` script
    #[arg(short, long, value_name = "FILE", conflicts_with = "serve")]
    replay: Option<PathBuf>,

    /// Extra simulated time after the last replay step (ms)
    #[arg(long, default_value_t = 0)]
    tail_ms: u64,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Server address, overrides the config file
    #[arg(long)]
    addr: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rotalock=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    if args.no_color {
        colored::control::set_override(false);
    }

    let mut config = match &args.config {
        Some(path) => LockConfig::load(path)?,
        None => LockConfig::default(),
    };
    if let Some(addr) = &args.addr {
        config.server.addr = addr.clone();
    }
    config.validate()?;
    debug!(?config, "configuration loaded");

    if args.serve {
        info!("Starting rotalock v{}", VERSION);
        run_server(&config).await?;
    } else if let Some(path) = &args.replay {
        run_replay(path, &config, &args)?;
    } else {
        // Default to the live bridge if no mode specified
        run_stdin(&config, &args).await?;
    }
    Ok(())
}

/// Replay a script on a simulated clock
fn run_replay(path: &Path, config: &LockConfig, args: &Args) -> anyhow::Result<()> {
    let script = std::fs::read_to_string(path)?;
    let steps = parse_script(&script)?;
    let report = run_script(config, config.password_sequence()?, &steps, args.tail_ms)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Replayed {} steps over {} ms", steps.len(), report.end_ms);
    for outcome in &report.outcomes {
        print_outcome(outcome, false);
    }
    print_state(&report.final_state, args.no_color);
    if report.dropped_inputs > 0 {
        println!("Dropped inputs: {}", report.dropped_inputs);
    }
    Ok(())
}

/// Live bridge: feed stdin lines to the evaluator, tick in between
async fn run_stdin(config: &LockConfig, args: &Args) -> anyhow::Result<()> {
    let sink = MemorySink::new();
    let mut engine =
        RotaryLockEvaluator::from_config(config, SystemClock::new(), Box::new(sink.clone()))?;

    if !args.json {
        print_header(config);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut interval =
        tokio::time::interval(Duration::from_millis(config.server.tick_interval_ms));
    let mut decoder = if args.raw_adc {
        LineDecoder::raw_adc()
    } else {
        LineDecoder::Angle
    };
    let mut last_line = String::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
                    break;
                }
                match decoder.decode(line) {
                    Some(angle) => engine.on_angle_update(angle),
                    None => {
                        debug!(line, "no angle to report");
                        continue;
                    }
                }
            }
            _ = interval.tick() => engine.tick(),
        }

        for outcome in sink.drain() {
            if args.json {
                println!("{}", serde_json::to_string(&outcome)?);
            } else {
                print_outcome(&outcome, true);
            }
        }

        if !args.json {
            let output = engine.current_output();
            let rendered = output.to_parseable_string();
            // Only print when something visible changed
            if rendered != last_line && !output.state.is_verdict() {
                print_state(&output, args.no_color);
                last_line = rendered;
            }
        }
    }

    if !args.json {
        println!("\nSession ended. Attempts: {}", engine.attempts());
    }
    Ok(())
}

/// Print header
fn print_header(config: &LockConfig) {
    println!("{}", format!("Rotalock v{} - Live Mode", VERSION).bold());
    println!(
        "Hold each color for {:.1}s. Password has {} colors. Type 'quit' to exit.",
        config.dwell_duration_ms as f64 / 1000.0,
        config.sequence_length
    );
    println!();
}

fn print_state(output: &StateOutput, no_color: bool) {
    if no_color {
        println!("{}", output.to_parseable_string());
    } else {
        println!("{}", output.to_terminal_string());
    }
}

fn print_outcome(outcome: &AuthOutcome, bell: bool) {
    let sequence = format_sequence(&outcome.confirmed_sequence);
    match outcome.status {
        AuthStatus::Success => {
            if bell {
                print!("\x07");
            }
            println!("{}", format!("  ✓ ACCESS GRANTED [{}]", sequence).green().bold());
        }
        AuthStatus::Failure => {
            println!("{}", format!("  ✗ ACCESS DENIED [{}]", sequence).red().bold());
        }
    }
    println!("{}", format!("  {}", outcome.summary()).dimmed());
}
