//! OCR-driven enhancement macro for a chat-game bot.
//!
//! Watches a chat window through screen capture and OCR, sends the
//! enhancement command, classifies the bot's reply, and keeps per-level
//! success statistics across runs.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use enhancer::core::simulate::{DEFAULT_GOAL, DEFAULT_TRIALS};
use enhancer::session::WindowLostError;
use enhancer::{cli, exit_codes, logging};

#[derive(Parser)]
#[command(
    name = "enhancer",
    version,
    about = "OCR-driven enhancement macro for a chat-game bot"
)]
struct Cli {
    /// Config file path.
    #[arg(long, global = true, default_value = "enhancer.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a starter config file.
    Init {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
    /// Run the loop until the target, the gold floor, or a stop request.
    Run {
        /// Level the item currently holds.
        #[arg(long, default_value_t = 0)]
        from: u32,
        /// Chat room to target (overrides the config file).
        #[arg(long)]
        room: Option<String>,
        /// Target level (overrides the config file).
        #[arg(long)]
        target: Option<u32>,
        /// Stop once remaining gold drops under this (overrides the config file).
        #[arg(long)]
        gold_floor: Option<u64>,
    },
    /// Show recorded statistics.
    Stats,
    /// Project the chance of reaching a level from the recorded rates.
    Simulate {
        #[arg(long, default_value_t = DEFAULT_GOAL)]
        goal: u32,
        #[arg(long, default_value_t = DEFAULT_TRIALS)]
        trials: u32,
    },
    /// Wipe recorded statistics.
    Reset {
        /// Confirm the wipe.
        #[arg(long)]
        yes: bool,
    },
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        let code = if err.downcast_ref::<WindowLostError>().is_some() {
            exit_codes::UNREACHABLE
        } else {
            exit_codes::INVALID
        };
        std::process::exit(code);
    }
}

fn run() -> Result<()> {
    let Cli { config, command } = Cli::parse();
    match command {
        Command::Init { force } => cli::init_config(&config, force),
        Command::Run {
            from,
            room,
            target,
            gold_floor,
        } => cli::run_macro(
            &config,
            from,
            cli::RunOverrides {
                room,
                target_level: target,
                gold_floor,
            },
        ),
        Command::Stats => cli::show_stats(&config),
        Command::Simulate { goal, trials } => cli::simulate(&config, goal, trials),
        Command::Reset { yes } => cli::reset_stats(&config, yes),
    }
}
