//! Source directory reconciliation
//!
//! Walks the direct children of the source root, turns movie folders into
//! candidates, and moves every candidate the catalog doesn't know about into
//! the target root. Candidates are handled one at a time, to completion.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::catalog::{CatalogIndex, directory_key_for, title_key};
use super::file_utils::{contains_video, is_video_file};
use super::filename_parser::parse_movie;
use super::mover::move_into;
use super::report::OutcomeRecord;
use crate::config::MatchStrategy;
use crate::error::OrganizeError;

pub const ALREADY_IN_LIBRARY: &str = "already in library";

/// A source entry that looks like a movie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateItem {
    pub source_path: PathBuf,
    pub display_name: String,
    pub year: Option<u32>,
}

impl CandidateItem {
    /// Key used to look the candidate up in the catalog.
    ///
    /// Directory keys use the candidate folder itself. Emby keys a movie on
    /// the folder holding the file, which is this folder or one below it;
    /// [CatalogIndex::lookup] covers both.
    pub fn lookup_key(&self, strategy: MatchStrategy) -> String {
        match strategy {
            MatchStrategy::Directory => directory_key_for(&self.source_path),
            MatchStrategy::Title => title_key(&self.display_name),
        }
    }
}

/// Classify one direct child of the source root.
///
/// Directories qualify when they hold at least one video file anywhere below
/// them. Loose video files only qualify under the title strategy, where the
/// library is laid out flat.
pub fn classify(path: &Path, is_dir: bool, strategy: MatchStrategy) -> Option<CandidateItem> {
    let file_name = path.file_name()?.to_string_lossy().into_owned();

    let name = if is_dir {
        if !contains_video(path) {
            return None;
        }
        file_name
    } else {
        if strategy != MatchStrategy::Title || !is_video_file(&file_name) {
            return None;
        }
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(file_name)
    };

    let parsed = parse_movie(&name);
    Some(CandidateItem {
        source_path: path.to_path_buf(),
        display_name: parsed.title,
        year: parsed.year,
    })
}

pub struct Reconciler {
    source_root: PathBuf,
    target_root: PathBuf,
}

impl Reconciler {
    pub fn new(source_root: impl Into<PathBuf>, target_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            target_root: target_root.into(),
        }
    }

    /// Reconcile the source root against `index`, returning one outcome per
    /// candidate in name order. A failed move never stops the run.
    pub async fn run(&self, index: &CatalogIndex) -> Result<Vec<OutcomeRecord>, OrganizeError> {
        let strategy = index.strategy();
        let mut outcomes = Vec::new();

        for (path, is_dir) in self.list_source_entries().await? {
            let Some(candidate) = classify(&path, is_dir, strategy) else {
                debug!(path = %path.display(), "No video files, not a candidate");
                continue;
            };
            outcomes.push(self.handle_candidate(&candidate, index).await);
        }

        Ok(outcomes)
    }

    async fn handle_candidate(&self, candidate: &CandidateItem, index: &CatalogIndex) -> OutcomeRecord {
        let key = candidate.lookup_key(index.strategy());

        if let Some(entry) = index.lookup(&key) {
            debug!(
                path = %candidate.source_path.display(),
                catalog_name = %entry.display_name,
                "Already in library"
            );
            return OutcomeRecord::skipped(&candidate.display_name, ALREADY_IN_LIBRARY);
        }

        match move_into(&candidate.source_path, &self.target_root).await {
            Ok(dest) => {
                info!(
                    source = %candidate.source_path.display(),
                    dest = %dest.display(),
                    year = ?candidate.year,
                    "Moved movie"
                );
                OutcomeRecord::moved(&candidate.display_name, dest.to_string_lossy())
            }
            Err(e) => {
                warn!(
                    source = %candidate.source_path.display(),
                    error = %e,
                    "Failed to move movie"
                );
                OutcomeRecord::failed(&candidate.display_name, e.to_string())
            }
        }
    }

    /// Direct children of the source root, sorted by name.
    ///
    /// The root is canonicalized first so candidate paths are absolute like
    /// the ones Emby reports, whatever form the root was configured in.
    async fn list_source_entries(&self) -> Result<Vec<(PathBuf, bool)>, OrganizeError> {
        let io_err = |source| OrganizeError::Io {
            path: self.source_root.clone(),
            source,
        };

        let root = tokio::fs::canonicalize(&self.source_root).await.map_err(io_err)?;
        let mut entries = tokio::fs::read_dir(&root).await.map_err(io_err)?;
        let mut listed = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            match tokio::fs::metadata(&path).await {
                Ok(meta) => listed.push((path, meta.is_dir())),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable entry"),
            }
        }

        listed.sort();
        Ok(listed)
    }
}
