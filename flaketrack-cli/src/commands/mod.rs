pub mod executions;
pub mod init;
pub mod ratios;
pub mod report;
pub mod write;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;

use flaketrack_core::config::{CONFIG_FILE_NAME, FlaketrackConfig};
use flaketrack_core::progress::IndicatifReporter;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default flaketrack.toml
    Init(init::InitArgs),
    /// Print the flaky tests from the freshest reporter build
    Report(report::ReportArgs),
    /// Create a flaky-test report artifact for one repository
    Write(write::WriteArgs),
    /// CSV of what the retryer did on recent pull requests
    Executions(executions::ExecutionsArgs),
    /// CSV of manual retries per merged pull request per day
    Ratios(ratios::RatiosArgs),
}

/// Options shared by every subcommand.
#[derive(Debug, Default)]
pub struct Globals {
    pub config: Option<PathBuf>,
    pub quiet: bool,
}

impl Globals {
    /// Load the explicit `--config` file, or `./flaketrack.toml` when present.
    pub fn load_config(&self) -> anyhow::Result<FlaketrackConfig> {
        match &self.config {
            Some(path) => FlaketrackConfig::load(path)
                .with_context(|| format!("Cannot load config {}", path.display())),
            None => {
                let path = Path::new(CONFIG_FILE_NAME);
                FlaketrackConfig::load_or_default(path)
                    .with_context(|| format!("Cannot load config {}", path.display()))
            }
        }
    }

    pub fn progress(&self) -> IndicatifReporter {
        if self.quiet {
            IndicatifReporter::hidden()
        } else {
            IndicatifReporter::new()
        }
    }
}

pub async fn run(cmd: Command, globals: &Globals) -> anyhow::Result<()> {
    match cmd {
        Command::Init(args) => init::run(args, globals),
        Command::Report(args) => report::run(args, globals).await,
        Command::Write(args) => write::run(args, globals),
        Command::Executions(args) => executions::run(args, globals).await,
        Command::Ratios(args) => ratios::run(args, globals).await,
    }
}

/// Write `contents` to `output`, or to stdout when `output` is `-`.
pub fn write_output(output: &Path, contents: &str) -> anyhow::Result<()> {
    if output == Path::new("-") {
        print!("{contents}");
        return Ok(());
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create directory {}", parent.display()))?;
    }
    std::fs::write(output, contents)
        .with_context(|| format!("Cannot write {}", output.display()))
}
