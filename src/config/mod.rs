//! Application configuration management

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigProblem};

pub const DEFAULT_CRON: &str = "0 2 * * *";
pub const DEFAULT_EMBY_URL: &str = "http://127.0.0.1:8096";

/// How catalog items and candidates are turned into identity keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    /// Key on the folder that holds the movie file (one movie per folder)
    #[default]
    Directory,
    /// Key on the lower-cased title (flat layouts, files directly in the root)
    Title,
}

impl MatchStrategy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "directory" | "dir" | "path" => Some(Self::Directory),
            "title" | "name" => Some(Self::Title),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::Title => "title",
        }
    }
}

/// Rewrites paths reported by Emby into the paths this host sees.
///
/// Emby often runs in a container where the library is mounted somewhere
/// else (e.g. `/media/movies` on the server is `/mnt/storage/movies` here).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMapping {
    pub server_prefix: String,
    pub local_prefix: String,
}

impl PathMapping {
    /// Apply the mapping, leaving paths outside the server prefix untouched.
    ///
    /// The prefix only matches whole path components: `/media` maps
    /// `/media/Heat` but not `/media2/Heat`.
    pub fn apply(&self, path: &str) -> String {
        let server_prefix = self.server_prefix.trim_end_matches(['/', '\\']);
        let local_prefix = self.local_prefix.trim_end_matches(['/', '\\']);

        match path.strip_prefix(server_prefix) {
            Some(rest) if rest.is_empty() || rest.starts_with(['/', '\\']) => {
                format!("{}{}", local_prefix, rest)
            }
            _ => path.to_string(),
        }
    }
}

/// Organizer configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Master switch for scheduled runs
    pub enabled: bool,

    /// Run a reconciliation immediately when the configuration is applied
    pub run_once: bool,

    /// Cron expression (5-field crontab or 6-field with seconds)
    pub cron: String,

    /// Directory scanned for movie folders
    pub source_path: PathBuf,

    /// Holding directory that receives uncatalogued folders
    pub target_path: PathBuf,

    /// Emby server base URL
    pub emby_url: String,

    /// Emby API key, sent as X-Emby-Token
    pub emby_api_key: String,

    /// Send notifications for reports and failures
    pub notify: bool,

    pub match_strategy: MatchStrategy,

    pub path_mapping: Option<PathMapping>,

    /// Optional webhook that receives notifications as JSON
    pub webhook_url: Option<String>,

    /// Port for the HTTP control API (disabled when unset)
    pub http_port: Option<u16>,

    /// Timeout for the catalog request
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: false,
            run_once: false,
            cron: DEFAULT_CRON.to_string(),
            source_path: PathBuf::new(),
            target_path: PathBuf::new(),
            emby_url: DEFAULT_EMBY_URL.to_string(),
            emby_api_key: String::new(),
            notify: true,
            match_strategy: MatchStrategy::Directory,
            path_mapping: None,
            webhook_url: None,
            http_port: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let match_strategy = match env::var("MATCH_STRATEGY") {
            Ok(value) => MatchStrategy::from_str(&value)
                .with_context(|| format!("Invalid MATCH_STRATEGY: {}", value))?,
            Err(_) => defaults.match_strategy,
        };

        let path_mapping = match (env::var("EMBY_PATH_PREFIX"), env::var("LOCAL_PATH_PREFIX")) {
            (Ok(server_prefix), Ok(local_prefix)) if !server_prefix.is_empty() => Some(PathMapping {
                server_prefix,
                local_prefix,
            }),
            _ => None,
        };

        let http_port = match env::var("HTTP_PORT") {
            Ok(port) if !port.is_empty() => Some(port.parse().context("Invalid HTTP_PORT")?),
            _ => None,
        };

        let request_timeout = match env::var("EMBY_TIMEOUT_SECS") {
            Ok(secs) => Duration::from_secs(secs.parse().context("Invalid EMBY_TIMEOUT_SECS")?),
            Err(_) => defaults.request_timeout,
        };

        Ok(Self {
            enabled: env_flag("ORGANIZER_ENABLED", defaults.enabled),

            run_once: env_flag("ORGANIZER_RUN_ONCE", defaults.run_once),

            cron: env::var("ORGANIZER_CRON").unwrap_or(defaults.cron),

            source_path: env::var("SOURCE_PATH")
                .map(PathBuf::from)
                .unwrap_or_default(),

            target_path: env::var("TARGET_PATH")
                .map(PathBuf::from)
                .unwrap_or_default(),

            emby_url: env::var("EMBY_URL").unwrap_or(defaults.emby_url),

            emby_api_key: env::var("EMBY_API_KEY").unwrap_or_default(),

            notify: env_flag("ORGANIZER_NOTIFY", defaults.notify),

            match_strategy,

            path_mapping,

            webhook_url: env::var("NOTIFY_WEBHOOK_URL").ok().filter(|u| !u.is_empty()),

            http_port,

            request_timeout,
        })
    }

    /// Check everything a run needs, collecting every problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if !is_dir(&self.source_path) {
            problems.push(ConfigProblem::InvalidSource(self.source_path.clone()));
        }
        if !is_dir(&self.target_path) {
            problems.push(ConfigProblem::InvalidTarget(self.target_path.clone()));
        }
        if self.emby_api_key.trim().is_empty() {
            problems.push(ConfigProblem::MissingApiKey);
        }
        if url::Url::parse(&self.emby_url).is_err() {
            problems.push(ConfigProblem::InvalidServerUrl(self.emby_url.clone()));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError { problems })
        }
    }
}

fn is_dir(path: &Path) -> bool {
    !path.as_os_str().is_empty() && path.is_dir()
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config(source: &Path, target: &Path) -> Config {
        Config {
            source_path: source.to_path_buf(),
            target_path: target.to_path_buf(),
            emby_api_key: "secret".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        let source = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        assert!(valid_config(source.path(), target.path()).validate().is_ok());
    }

    #[test]
    fn test_validate_collects_all_problems() {
        let config = Config::default();
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.problems,
            vec![
                ConfigProblem::InvalidSource(PathBuf::new()),
                ConfigProblem::InvalidTarget(PathBuf::new()),
                ConfigProblem::MissingApiKey,
            ]
        );
    }

    #[test]
    fn test_validate_rejects_file_as_target() {
        let source = tempfile::tempdir().unwrap();
        let file = source.path().join("not-a-dir.txt");
        std::fs::write(&file, b"x").unwrap();

        let config = valid_config(source.path(), &file);
        let err = config.validate().unwrap_err();
        assert_eq!(err.problems, vec![ConfigProblem::InvalidTarget(file)]);
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            emby_url: "not a url".to_string(),
            ..valid_config(dir.path(), dir.path())
        };
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.problems,
            vec![ConfigProblem::InvalidServerUrl("not a url".to_string())]
        );
    }

    #[test]
    fn test_match_strategy_parsing() {
        assert_eq!(MatchStrategy::from_str("Directory"), Some(MatchStrategy::Directory));
        assert_eq!(MatchStrategy::from_str(" title "), Some(MatchStrategy::Title));
        assert_eq!(MatchStrategy::from_str("fuzzy"), None);
    }

    #[test]
    fn test_path_mapping() {
        let mapping = PathMapping {
            server_prefix: "/media/movies".to_string(),
            local_prefix: "/mnt/storage/movies".to_string(),
        };
        assert_eq!(
            mapping.apply("/media/movies/Alien (1979)"),
            "/mnt/storage/movies/Alien (1979)"
        );
        assert_eq!(mapping.apply("/other/Alien (1979)"), "/other/Alien (1979)");
    }

    #[test]
    fn test_path_mapping_respects_component_boundaries() {
        let mapping = PathMapping {
            server_prefix: "/media".to_string(),
            local_prefix: "/mnt/nas".to_string(),
        };
        assert_eq!(mapping.apply("/media2/Heat/heat.mkv"), "/media2/Heat/heat.mkv");
        assert_eq!(mapping.apply("/media/Heat/heat.mkv"), "/mnt/nas/Heat/heat.mkv");
        assert_eq!(mapping.apply("/media"), "/mnt/nas");

        let trailing = PathMapping {
            server_prefix: "/media/".to_string(),
            local_prefix: "/mnt/nas/".to_string(),
        };
        assert_eq!(trailing.apply("/media/Heat/heat.mkv"), "/mnt/nas/Heat/heat.mkv");
    }
}
