//! Command line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;

/// Moves movie folders that Emby has not catalogued into a holding directory
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory scanned for movie folders (overrides SOURCE_PATH)
    #[arg(long, global = true)]
    pub source: Option<PathBuf>,

    /// Holding directory for uncatalogued movies (overrides TARGET_PATH)
    #[arg(long, global = true)]
    pub target: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run one reconciliation pass, print the report as JSON and exit
    Run,
    /// Keep running: scheduled runs plus the optional control API
    Daemon {
        /// Run once immediately after starting
        #[arg(long)]
        once: bool,
    },
}

impl Cli {
    /// Apply command line overrides on top of the environment config
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(ref source) = self.source {
            config.source_path = source.clone();
        }
        if let Some(ref target) = self.target {
            config.target_path = target.clone();
        }
        if let Some(Command::Daemon { once: true }) = self.command {
            config.run_once = true;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply_to_config() {
        let cli = Cli::parse_from([
            "emby-organizer",
            "daemon",
            "--once",
            "--source",
            "/downloads",
        ]);
        let config = cli.apply(Config::default());

        assert_eq!(config.source_path, PathBuf::from("/downloads"));
        assert!(config.run_once);
        assert_eq!(config.target_path, PathBuf::new());
    }

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::parse_from(["emby-organizer"]);
        assert_eq!(cli.command, None);
    }
}
