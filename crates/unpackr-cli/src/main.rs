//! unpackr-cli - Command-line interface for the unpackr tool
//!
//! Walks a directory tree, extracts every archive it finds into a sibling
//! folder and keeps going into the extracted content.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use unpackr_core::config::Config;
use unpackr_core::observer::{FanoutObserver, TracingObserver, WalkObserver};
use unpackr_core::{WalkReport, Walker};

mod progress;

use progress::ProgressObserver;

/// unpackr - recursively unpack every archive in a folder
///
/// Archives (7z, zip, tar.gz, tar.bz2, tar) are extracted into a folder named
/// after the archive, next to it. Existing folders are never overwritten; a
/// numeric suffix is appended instead.
#[derive(Parser)]
#[command(name = "unpackr")]
#[command(author, version, about = "Recursively unpack every archive in a folder", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Configuration file to use instead of the default location
    #[arg(long, global = true, env = "UNPACKR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    unpack: UnpackArgs,
}

#[derive(Args)]
struct UnpackArgs {
    /// Folder to scan; prompted for when omitted on a terminal
    root: Option<PathBuf>,

    /// Delete each archive after it was extracted
    #[arg(long)]
    delete: bool,

    /// Do not unpack archives found inside extracted folders
    #[arg(long)]
    no_recurse: bool,

    /// Maximum nesting depth of archives to descend into
    #[arg(long)]
    max_depth: Option<usize>,

    /// Exit with a non-zero code if any archive failed to extract or delete
    #[arg(long)]
    strict: bool,

    /// Print the walk report as JSON
    #[arg(long)]
    json: bool,

    /// Show a progress spinner while walking
    #[arg(long)]
    progress: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Unpack all archives under a folder (the default command)
    Unpack(UnpackArgs),

    /// Show or create the configuration file
    Config {
        /// Show the effective configuration
        #[arg(long, conflicts_with_all = ["path", "init"])]
        show: bool,

        /// Show the configuration file path
        #[arg(long, conflicts_with_all = ["show", "init"])]
        path: bool,

        /// Write the default configuration file if it does not exist
        #[arg(long, conflicts_with_all = ["show", "path"])]
        init: bool,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    match run() {
        Ok(()) => process::exit(0),
        Err(e) => {
            error!("Error: {}", e);

            let exit_code = map_error_to_exit_code(&e);
            process::exit(exit_code);
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Some(Commands::Unpack(args)) => unpack(args, cli.config, cli.quiet),
        Some(Commands::Config { show, path, init }) => {
            handle_config(cli.config, show, path, init)
        }
        None => unpack(cli.unpack, cli.config, cli.quiet),
    }
}

fn load_config(explicit: Option<&PathBuf>) -> Result<Config> {
    match explicit {
        Some(path) => Ok(Config::load_from(path)?),
        None => Ok(Config::load_or_default()),
    }
}

fn unpack(args: UnpackArgs, config_path: Option<PathBuf>, quiet: bool) -> Result<()> {
    let mut config = load_config(config_path.as_ref())?;
    if args.delete {
        config.walk.delete_after_extract = true;
    }
    if args.no_recurse {
        config.walk.recursive = false;
    }
    if let Some(max_depth) = args.max_depth {
        config.walk.max_depth = max_depth;
    }

    let root = resolve_root(args.root)?;
    info!("Unpacking archives under {:?}", root);

    let progress = args.progress.then(|| Arc::new(ProgressObserver::new()));
    let observer: Arc<dyn WalkObserver> = match &progress {
        Some(progress) => {
            let observers: Vec<Box<dyn WalkObserver + Send + Sync>> =
                vec![Box::new(TracingObserver), Box::new(progress.clone())];
            Arc::new(FanoutObserver::new(observers))
        }
        None => Arc::new(TracingObserver),
    };

    let walker = Walker::from_config(&config).with_observer(observer);
    let result = walker.unpack_tree(&root);

    if let Some(progress) = &progress {
        progress.finish();
    }
    let report = result?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !quiet {
        print_summary(&report);
    }

    if args.strict && !report.is_clean() {
        return Err(unpackr_core::Error::PartialFailure {
            count: report.failure_count() as u32,
        }
        .into());
    }

    info!("Unpacking complete");
    Ok(())
}

/// Use the given root, or ask for one when running interactively
fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(root) = root {
        return Ok(root);
    }

    if !std::io::stdin().is_terminal() {
        return Err(unpackr_core::Error::InvalidPath(
            "no folder given and stdin is not a terminal".to_string(),
        )
        .into());
    }

    let input: String = dialoguer::Input::new()
        .with_prompt("Folder to unpack")
        .interact_text()?;
    Ok(PathBuf::from(input.trim()))
}

fn print_summary(report: &WalkReport) {
    println!(
        "Unpacked {} of {} archives ({} failed, {} deleted)",
        report.extracted.len(),
        report.archives_found,
        report.failed.len(),
        report.deleted
    );
    for archive in &report.failed {
        println!("  extraction failed: {}", archive.display());
    }
    for archive in &report.deletion_failures {
        println!("  deletion failed: {}", archive.display());
    }
}

fn handle_config(explicit: Option<PathBuf>, show: bool, path: bool, init: bool) -> Result<()> {
    if show {
        let config = load_config(explicit.as_ref())?;
        println!("{}", toml::to_string_pretty(&config)?);
    } else if path {
        let config_path = match explicit {
            Some(path) => path,
            None => Config::config_path()?,
        };
        println!("{}", config_path.display());
    } else if init {
        let config_path = match explicit {
            Some(path) => path,
            None => Config::config_path()?,
        };
        if config_path.exists() {
            info!("Configuration already exists at {:?}", config_path);
        } else {
            std::fs::write(&config_path, Config::default_config_content())?;
            info!("Created default configuration at {:?}", config_path);
        }
        println!("{}", config_path.display());
    } else {
        eprintln!("Please specify --show, --path, or --init");
    }

    Ok(())
}

/// Map errors to exit codes:
/// - 0: Success (including walks with failed archives, unless --strict)
/// - 1: General error
/// - 2: IO error
/// - 3: Invalid arguments or paths
/// - 4: Partial failure
fn map_error_to_exit_code(err: &anyhow::Error) -> i32 {
    if let Some(core_err) = err.downcast_ref::<unpackr_core::Error>() {
        match core_err {
            unpackr_core::Error::Io(_) => 2,
            unpackr_core::Error::InvalidPath(_) => 3,
            unpackr_core::Error::Config(_) => 1,
            unpackr_core::Error::PartialFailure { .. } => 4,
            unpackr_core::Error::Decode { .. } => 4,
            unpackr_core::Error::ExtractionFailed { .. } => 4,
            unpackr_core::Error::PermissionDenied(_) => 4,
            unpackr_core::Error::DeletionFailed { .. } => 4,
            unpackr_core::Error::Other(_) => 1,
        }
    } else if err.is::<std::io::Error>() {
        2
    } else {
        1
    }
}
