use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use flaketrack_core::config::{CONFIG_FILE_NAME, FlaketrackConfig};

use super::Globals;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to write flaketrack.toml into
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs, globals: &Globals) -> anyhow::Result<()> {
    let config_path = args.path.join(CONFIG_FILE_NAME);
    if config_path.exists() && !args.force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::create_dir_all(&args.path)
        .with_context(|| format!("Cannot create directory {}", args.path.display()))?;
    let contents = toml::to_string_pretty(&FlaketrackConfig::default())
        .context("Cannot serialize default config")?;
    std::fs::write(&config_path, contents)
        .with_context(|| format!("Cannot write {}", config_path.display()))?;

    if !globals.quiet {
        println!("Wrote {}", config_path.display());
    }
    Ok(())
}
