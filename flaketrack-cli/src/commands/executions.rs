use std::path::PathBuf;

use clap::Args;
use tracing::info;

use flaketrack_core::forge::GitHubClient;
use flaketrack_core::metrics::ExecutionsReport;
use flaketrack_core::metrics::{executions, timerange};

use super::Globals;

#[derive(Args, Debug)]
pub struct ExecutionsArgs {
    /// How far back to scan, e.g. 24h or 7days
    #[arg(long, default_value = "24h")]
    pub range: String,

    /// CSV destination, `-` for stdout
    #[arg(long, default_value = "data.csv")]
    pub output: PathBuf,

    /// Repository to scan (overrides github.repo)
    #[arg(long)]
    pub repo: Option<String>,
}

pub async fn run(args: ExecutionsArgs, globals: &Globals) -> anyhow::Result<()> {
    let mut config = globals.load_config()?;
    if let Some(repo) = args.repo {
        config.github.repo = repo;
    }
    let since = timerange::range_start(&args.range, chrono::Utc::now())?;
    info!(since = %since.format("%e %b %Y %H:%M:%S"), "Scanning PRs");

    let forge = GitHubClient::from_config(&config.github);
    let progress = globals.progress();
    let records = ExecutionsReport::new(&forge, &config)
        .collect(since, &progress)
        .await?;

    super::write_output(&args.output, &executions::render_csv(&records))?;
    if !globals.quiet && args.output.as_os_str() != "-" {
        println!("Wrote {} rows to {}", records.len(), args.output.display());
    }
    Ok(())
}
