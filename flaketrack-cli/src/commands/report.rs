use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use flaketrack_core::report::ReportClient;
use flaketrack_core::store::local::LocalBuildStore;
use flaketrack_core::types::BuildSelector;

use super::Globals;

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Repository to read reports for (default: all repositories)
    #[arg(long)]
    pub repo: Option<String>,

    /// Build to read: `latest` or a build number
    #[arg(long, default_value = "latest")]
    pub build: BuildSelector,

    /// Output format: text, json
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Build storage root (overrides reporter.store_root)
    #[arg(long)]
    pub store_root: Option<PathBuf>,
}

pub async fn run(args: ReportArgs, globals: &Globals) -> anyhow::Result<()> {
    let config = globals.load_config()?;
    let root = args
        .store_root
        .unwrap_or_else(|| config.reporter.store_root.clone());
    let store = LocalBuildStore::new(root);
    let client = ReportClient::new(&store, &config.reporter);
    let repo = args.repo.unwrap_or_default();

    let (reports, flaky) = client
        .parse_with_filter(&repo, args.build, |report| {
            report
                .flaky
                .iter()
                .map(|test| format!("{}: {test}", report.repo))
                .collect::<Vec<_>>()
        })
        .await?;

    match args.format.as_str() {
        "json" => {
            let json =
                serde_json::to_string_pretty(&reports).context("Cannot serialize reports")?;
            println!("{json}");
        }
        "text" => {
            for line in &flaky {
                println!("{line}");
            }
            if !globals.quiet {
                eprintln!(
                    "{} flaky test{} across {} report{}",
                    flaky.len(),
                    if flaky.len() == 1 { "" } else { "s" },
                    reports.len(),
                    if reports.len() == 1 { "" } else { "s" },
                );
            }
        }
        other => anyhow::bail!("Unknown format: {other} (expected text or json)"),
    }
    Ok(())
}
