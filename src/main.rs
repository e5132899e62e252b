/*!
 * midsync CLI - Command Line Interface
 */

use clap::{Parser, Subcommand, ValueEnum};
use midsync::{
    config::{LogLevel, SyncConfig},
    core::{
        build_request,
        validation::{validate_directory, validate_file},
        Responder,
    },
    error::{Result, EXIT_SUCCESS},
    logging,
    output::{InspectReport, OutputWriter},
    Policy, RequestManifest,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "midsync")]
#[command(version, about = "One-directional directory sync through a shared midpoint", long_about = None)]
struct Cli {
    /// Configuration file (defaults to <config dir>/midsync/config.toml when present)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevelArg>,

    /// Write logs to this file as JSON instead of stderr
    #[arg(long = "log", value_name = "FILE", global = true)]
    log: Option<PathBuf>,

    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON Lines instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record the files DIRECTORY already has into a request in MIDPOINT
    Request {
        /// Directory to be brought up to date
        directory: PathBuf,

        /// Shared midpoint directory
        midpoint: PathBuf,

        /// Never push a file older than the one already held
        #[arg(short = 't', long)]
        mtime: bool,

        /// Never push a file smaller than the one already held
        #[arg(short = 's', long)]
        size: bool,

        /// Compare content with CRC-32 instead of modification time
        #[arg(short = 'c', long)]
        crc32: bool,
    },

    /// Stage the files REQUEST_FILE lacks from DIRECTORY into the midpoint
    Respond {
        /// Request file created by `midsync request`
        request_file: PathBuf,

        /// Directory holding the newer files
        directory: PathBuf,

        /// Only report what would be copied
        #[arg(long)]
        dry_run: bool,
    },

    /// Summarize a request file
    Inspect {
        /// Request file to read
        request_file: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let output = OutputWriter::new(cli.json);

    let code = match run(cli, output) {
        Ok(code) => code,
        Err(e) => {
            output.error(&e.to_string());
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli, output: OutputWriter) -> Result<i32> {
    let mut config = SyncConfig::load(cli.config.as_deref())?;

    if let Some(level) = cli.log_level {
        config.log_level = level.into();
    }
    if cli.log.is_some() {
        config.log_file = cli.log.clone();
    }
    config.verbose |= cli.verbose;

    if let Err(e) = logging::init_logging(&config) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    match cli.command {
        Commands::Request {
            directory,
            midpoint,
            mtime,
            size,
            crc32,
        } => {
            validate_directory(&directory)?;
            validate_directory(&midpoint)?;

            let defaults = config.request_defaults;
            let policy = Policy::new(
                mtime || defaults.mtime,
                size || defaults.size,
                crc32 || defaults.crc32,
            );

            let summary = build_request(&directory, &midpoint, policy, &config)?;
            output.request_created(&summary);
            Ok(EXIT_SUCCESS)
        }

        Commands::Respond {
            request_file,
            directory,
            dry_run,
        } => {
            validate_file(&request_file)?;
            validate_directory(&directory)?;

            let dry_run = dry_run || config.dry_run;
            let outcome = Responder::new(config)
                .dry_run(dry_run)
                .on_event(move |event| output.respond_event(event))
                .respond(&request_file, &directory)?;

            output.respond_finished(&request_file, &outcome, dry_run);
            Ok(outcome.exit_code())
        }

        Commands::Inspect { request_file } => {
            validate_file(&request_file)?;

            let manifest = RequestManifest::load(&request_file)?;
            output.inspect(&InspectReport::from_manifest(&manifest));
            Ok(EXIT_SUCCESS)
        }
    }
}
