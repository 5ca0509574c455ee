//! OxiLZ4 CLI
//!
//! Compress, decompress, inspect and benchmark LZ4 frames with a Pure Rust codec.

mod commands;
mod utils;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use commands::{
    BlockSizeArg, CompressOptions, cmd_bench, cmd_compress, cmd_decompress, cmd_info, cmd_test,
};
use oxilz4::CompressionLevel;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "oxilz4")]
#[command(author, version, about = "Pure Rust LZ4 compressor")]
#[command(long_about = "
OxiLZ4 reads and writes the LZ4 frame format used by the lz4 tool.
Levels: 0 (fast), 3-9 (high compression), 10-12 (optimal parsing).

Examples:
  oxilz4 compress data.bin
  oxilz4 compress -l 9 --block-size 4m data.bin -o data.lz4
  oxilz4 decompress data.bin.lz4
  oxilz4 test data.bin.lz4
  oxilz4 info --json data.bin.lz4
  oxilz4 bench -l 0 -l 9 -l 12
  cat data.bin | oxilz4 compress - -o - > data.lz4
")]
struct Cli {
    /// Log codec activity (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file into an LZ4 frame
    #[command(alias = "c")]
    Compress {
        /// Input file, `-` for stdin
        input: PathBuf,

        /// Output file, `-` for stdout (default: input + .lz4)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Compression level: 0, or 3-12
        #[arg(short, long, default_value = "0")]
        level: CompressionLevel,

        /// Maximum block size
        #[arg(short = 'B', long, value_enum, default_value = "64k")]
        block_size: BlockSizeArg,

        /// Compress every block on its own
        #[arg(long)]
        independent: bool,

        /// Extra blocks of history to keep (0-16)
        #[arg(long, default_value_t = 0)]
        extra_memory: usize,

        /// Record the input size in the frame header
        #[arg(long)]
        content_size: bool,

        /// Write a single-shot envelope instead of a frame
        #[arg(long)]
        envelope: bool,

        /// Overwrite an existing output file
        #[arg(short, long)]
        force: bool,

        /// Show progress bar
        #[arg(short = 'P', long)]
        progress: bool,
    },

    /// Decompress an LZ4 frame
    #[command(alias = "d")]
    Decompress {
        /// Input file, `-` for stdin
        input: PathBuf,

        /// Output file, `-` for stdout (default: input without .lz4)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Read a single-shot envelope instead of a frame
        #[arg(long)]
        envelope: bool,

        /// Overwrite an existing output file
        #[arg(short, long)]
        force: bool,
    },

    /// Test the integrity of compressed files
    #[command(alias = "t")]
    Test {
        /// Files to test
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Files are single-shot envelopes
        #[arg(long)]
        envelope: bool,
    },

    /// Show the frame header and block layout
    #[command(alias = "i")]
    Info {
        /// Frame file to inspect
        file: PathBuf,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },

    /// Measure ratio and speed per level
    Bench {
        /// Input file (default: generated text)
        input: Option<PathBuf>,

        /// Size of the generated sample
        #[arg(short, long, default_value_t = 4 * 1024 * 1024)]
        size: usize,

        /// Levels to measure (repeatable)
        #[arg(short, long = "level", default_values = ["0", "3", "6", "9", "10", "12"])]
        levels: Vec<CompressionLevel>,

        /// Runs per level
        #[arg(short = 'n', long, default_value_t = 3)]
        iterations: u32,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Compress {
            input,
            output,
            level,
            block_size,
            independent,
            extra_memory,
            content_size,
            envelope,
            force,
            progress,
        } => {
            let options = CompressOptions {
                level,
                block_size,
                independent,
                extra_memory,
                content_size,
                envelope,
                force,
                progress,
                verbose: cli.verbose,
            };
            cmd_compress(&input, output.as_ref(), &options)
        }
        Commands::Decompress {
            input,
            output,
            envelope,
            force,
        } => cmd_decompress(&input, output.as_ref(), envelope, force, cli.verbose),
        Commands::Test { files, envelope } => cmd_test(&files, envelope, cli.verbose),
        Commands::Info { file, json } => cmd_info(&file, json),
        Commands::Bench {
            input,
            size,
            levels,
            iterations,
            no_progress,
        } => cmd_bench(input.as_ref(), size, &levels, iterations, !no_progress),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "oxilz4", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
