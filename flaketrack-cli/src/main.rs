use std::path::PathBuf;

use clap::Parser;
use flaketrack_core::error::{
    ConfigError, FlaketrackError, ForgeError, ParseError, ReportError, StoreError,
};

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "flaketrack",
    version,
    about = "Read flaky-test reports from CI builds and measure the flaky-test retryer"
)]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    /// Config file (default: ./flaketrack.toml if present)
    #[arg(long, global = true, env = "FLAKETRACK_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Map an error chain to the process exit code.
///
///   0: success
///   1: general/unknown error
///   2: configuration error
///   3: no usable report (none found, or outdated)
///   4: build store error
///   5: GitHub API error (network, auth, rate limit)
///
/// The outermost typed error in the chain decides. Untyped chains fall back
/// to matching the rendered message.
fn classify_exit_code(err: &anyhow::Error) -> i32 {
    if let Some(code) = err.chain().find_map(typed_exit_code) {
        return code;
    }

    let lower = format!("{err:#}").to_lowercase();
    if lower.contains("no json reports found") || lower.contains("report is outdated") {
        3 // no usable report
    } else if lower.contains("build store")
        || lower.contains("build not found")
        || lower.contains("invalid build metadata")
    {
        4 // build store error
    } else if lower.contains("github api") || lower.contains("rate limit") {
        5 // GitHub API error
    } else if lower.contains("config") {
        2 // config error
    } else {
        1 // general error
    }
}

fn typed_exit_code(cause: &(dyn std::error::Error + 'static)) -> Option<i32> {
    if let Some(err) = cause.downcast_ref::<FlaketrackError>() {
        return Some(match err {
            FlaketrackError::Report(e) => report_exit_code(e),
            FlaketrackError::Store(_) => 4,
            FlaketrackError::Forge(_) => 5,
            FlaketrackError::Config(_) => 2,
            FlaketrackError::Parse(_) => 1,
        });
    }
    if let Some(err) = cause.downcast_ref::<ReportError>() {
        return Some(report_exit_code(err));
    }
    if cause.is::<StoreError>() {
        Some(4)
    } else if cause.is::<ForgeError>() {
        Some(5)
    } else if cause.is::<ConfigError>() {
        Some(2)
    } else if cause.is::<ParseError>() {
        Some(1)
    } else {
        None
    }
}

fn report_exit_code(err: &ReportError) -> i32 {
    match err {
        ReportError::NotFound { .. } | ReportError::Stale { .. } => 3,
        ReportError::Io { .. } => 4,
        ReportError::Decode { .. } | ReportError::Write { .. } | ReportError::InvalidRepo(_) => 1,
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (_, 0) => "warn",
        (_, 1) => "info",
        (_, 2) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: Failed to create runtime: {e}");
            std::process::exit(1);
        }
    };

    let globals = commands::Globals {
        config: cli.config,
        quiet: cli.quiet,
    };
    match runtime.block_on(commands::run(cli.command, &globals)) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(classify_exit_code(&e));
        }
    }
}
