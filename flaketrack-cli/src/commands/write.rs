use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use flaketrack_core::report::ReportWriter;

use super::Globals;

#[derive(Args, Debug)]
pub struct WriteArgs {
    /// Repository the report describes
    #[arg(long)]
    pub repo: String,

    /// Flaky test names (repeat or comma-separate)
    #[arg(long = "test", value_delimiter = ',')]
    pub tests: Vec<String>,

    /// Artifacts directory (overrides reporter.artifacts_dir)
    #[arg(long)]
    pub artifacts_dir: Option<PathBuf>,

    /// Print the report without writing it
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(args: WriteArgs, globals: &Globals) -> anyhow::Result<()> {
    let config = globals.load_config()?;
    let writer = match args.artifacts_dir {
        Some(dir) => ReportWriter::new(dir, &config.reporter.report_filename),
        None => ReportWriter::from_config(&config.reporter),
    };

    let report = writer.create_report_for_repo(&args.repo, args.tests, !args.dry_run)?;

    if args.dry_run {
        let json = serde_json::to_string_pretty(&report).context("Cannot serialize report")?;
        println!("{json}");
    } else if !globals.quiet {
        println!(
            "Wrote {} flaky test{} to {}",
            report.flaky.len(),
            if report.flaky.len() == 1 { "" } else { "s" },
            writer.report_path(&report.repo).display()
        );
    }
    Ok(())
}
