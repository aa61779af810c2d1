use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::info;

use flaketrack_core::forge::GitHubClient;
use flaketrack_core::metrics::RatiosReport;
use flaketrack_core::metrics::{ratios, timerange};

use super::Globals;

#[derive(Args, Debug)]
pub struct RatiosArgs {
    /// Start date (YYYY-MM-DD) or how far back to scan (e.g. 720h)
    #[arg(long, default_value = "2019-07-01")]
    pub since: String,

    /// CSV destination, `-` for stdout
    #[arg(long, default_value = "data.csv")]
    pub output: PathBuf,

    /// Repository to scan (overrides github.repo)
    #[arg(long)]
    pub repo: Option<String>,
}

pub async fn run(args: RatiosArgs, globals: &Globals) -> anyhow::Result<()> {
    let mut config = globals.load_config()?;
    if let Some(repo) = args.repo {
        config.github.repo = repo;
    }
    let cutover = config
        .ratios
        .cutover()
        .context("Invalid ratios config")?;
    let now = chrono::Utc::now();
    let since = timerange::since_start(&args.since, now)?;
    info!(since = %since.format("%e %b %Y %H:%M:%S"), "Scanning PRs");

    let forge = GitHubClient::from_config(&config.github);
    let progress = globals.progress();
    let buckets = RatiosReport::new(&forge, &config)
        .collect(since, now, &progress)
        .await?;

    super::write_output(&args.output, &ratios::render_csv(&buckets, cutover))?;
    if !globals.quiet && args.output.as_os_str() != "-" {
        println!("Wrote {} days to {}", buckets.len(), args.output.display());
    }
    Ok(())
}
