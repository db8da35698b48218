//! Error types for the organizer
//!
//! Configuration problems stop a run before it starts. Catalog failures are
//! downgraded to an empty catalog by the loader, and move failures become
//! `Failed` outcomes in the report. Only [OrganizeError] ever reaches callers
//! of [OrganizerService::run_once](crate::services::OrganizerService::run_once).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A single reason the configuration cannot be used for a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigProblem {
    #[error("source directory is not a directory: {0}")]
    InvalidSource(PathBuf),

    #[error("target directory is not a directory: {0}")]
    InvalidTarget(PathBuf),

    #[error("Emby API key is not configured")]
    MissingApiKey,

    #[error("Emby URL is invalid: {0}")]
    InvalidServerUrl(String),
}

/// All configuration problems found by [Config::validate](crate::config::Config::validate).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid configuration: {}", join_problems(.problems))]
pub struct ConfigError {
    pub problems: Vec<ConfigProblem>,
}

impl ConfigError {
    /// Human readable list, comma separated, used for notifications.
    pub fn summary(&self) -> String {
        join_problems(&self.problems)
    }
}

fn join_problems(problems: &[ConfigProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Failure to fetch or decode the Emby catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Emby request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Emby request failed with status {0}")]
    Status(u16),

    #[error("Emby response could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Failure to move one candidate into the target directory.
#[derive(Debug, Error)]
pub enum MoveError {
    #[error("destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    #[error("{0}")]
    Io(#[from] io::Error),
}

/// Errors surfaced by a reconciliation run.
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("a reconciliation run is already in progress")]
    AlreadyRunning,

    #[error("failed to read source directory {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_lists_every_problem() {
        let err = ConfigError {
            problems: vec![ConfigProblem::MissingApiKey, ConfigProblem::InvalidTarget("/nope".into())],
        };
        assert_eq!(
            err.to_string(),
            "invalid configuration: Emby API key is not configured, target directory is not a directory: /nope"
        );
    }

    #[test]
    fn test_move_error_collision_message() {
        let err = MoveError::DestinationExists("/hold/Alien (1979)".into());
        assert_eq!(err.to_string(), "destination already exists: /hold/Alien (1979)");
    }
}
