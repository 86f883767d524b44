//! OxiBSC CLI - block-sorting compression from the command line.

mod commands;
mod utils;

use clap::{ArgAction, Parser, Subcommand};
use commands::{CompressOptions, cmd_compress, cmd_decompress, cmd_info, cmd_test};
use log::LevelFilter;
use oxibsc::DEFAULT_BLOCK_SIZE;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "oxibsc")]
#[command(
    author,
    version,
    about = "Pure Rust block-sorting compressor (BWT + MTF + range coding)"
)]
#[command(long_about = "
OxiBSC compresses files with a Burrows-Wheeler block sort, move-to-front
recoding and an adaptive range coder.

Examples:
  oxibsc compress data.txt
  oxibsc compress -b 4096 data.txt -o data.obsc
  oxibsc decompress data.txt.obsc
  oxibsc test data.txt.obsc
  oxibsc info --json data.txt.obsc
")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file
    #[command(alias = "c")]
    Compress {
        /// File to compress
        input: PathBuf,

        /// Output file (defaults to <input>.obsc)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Block size in KiB
        #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE / 1024)]
        block_size: usize,

        /// Do not store per-block checksums
        #[arg(long)]
        no_checksum: bool,

        /// Overwrite the output file if it exists
        #[arg(short, long)]
        force: bool,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Decompress a file
    #[command(alias = "d")]
    Decompress {
        /// File to decompress
        input: PathBuf,

        /// Output file (defaults to <input> without .obsc)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite the output file if it exists
        #[arg(short, long)]
        force: bool,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Decode a file and verify it without writing output
    #[command(alias = "t")]
    Test {
        /// File to test
        input: PathBuf,
    },

    /// Show frame header and stream statistics
    #[command(alias = "i")]
    Info {
        /// File to inspect
        input: PathBuf,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },
}

fn level_filter(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn main() {
    let cli = Cli::parse();

    if TermLogger::init(
        level_filter(cli.verbose),
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .is_err()
    {
        eprintln!("Warning: logger already initialized");
    }

    let result = match cli.command {
        Commands::Compress {
            input,
            output,
            block_size,
            no_checksum,
            force,
            no_progress,
        } => cmd_compress(&CompressOptions {
            input: &input,
            output: output.as_deref(),
            block_size_kib: block_size,
            checksum: !no_checksum,
            force,
            progress: !no_progress,
        }),
        Commands::Decompress {
            input,
            output,
            force,
            no_progress,
        } => cmd_decompress(&input, output.as_deref(), force, !no_progress),
        Commands::Test { input } => cmd_test(&input),
        Commands::Info { input, json } => cmd_info(&input, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
