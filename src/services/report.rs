//! Per-item outcomes and the run report built from them

use serde::{Deserialize, Serialize};

/// What happened to one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Moved,
    Skipped,
    Failed,
}

/// Outcome for one candidate. `detail` is the destination for moves and the
/// reason otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub name: String,
    pub status: OutcomeStatus,
    pub detail: Option<String>,
}

impl OutcomeRecord {
    pub fn moved(name: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: OutcomeStatus::Moved,
            detail: Some(destination.into()),
        }
    }

    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: OutcomeStatus::Skipped,
            detail: Some(reason.into()),
        }
    }

    pub fn failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: OutcomeStatus::Failed,
            detail: Some(reason.into()),
        }
    }
}

/// Summary of a reconciliation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub total: usize,
    pub moved: usize,
    pub skipped: usize,
    pub failed: usize,
    pub details: Vec<OutcomeRecord>,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &OutcomeRecord> {
        self.details
            .iter()
            .filter(|d| d.status == OutcomeStatus::Failed)
    }
}

pub struct ReportBuilder;

impl ReportBuilder {
    /// Count outcomes by status, keeping them in the order given.
    pub fn summarize(outcomes: Vec<OutcomeRecord>) -> RunReport {
        let count = |status: OutcomeStatus| outcomes.iter().filter(|o| o.status == status).count();

        RunReport {
            total: outcomes.len(),
            moved: count(OutcomeStatus::Moved),
            skipped: count(OutcomeStatus::Skipped),
            failed: count(OutcomeStatus::Failed),
            details: outcomes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_summarize_counts_and_order() {
        let outcomes = vec![
            OutcomeRecord::failed("Heat", "permission denied"),
            OutcomeRecord::moved("Alien", "/hold/Alien (1979)"),
            OutcomeRecord::skipped("Dune", "already in library"),
            OutcomeRecord::moved("Up", "/hold/Up (2009)"),
        ];

        let report = ReportBuilder::summarize(outcomes.clone());

        assert_eq!(report.total, 4);
        assert_eq!(report.moved, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.total, report.moved + report.skipped + report.failed);
        assert_eq!(report.details, outcomes);
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_summarize_empty() {
        let report = ReportBuilder::summarize(Vec::new());
        assert_eq!(report, RunReport::default());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&OutcomeRecord::skipped("Dune", "already in library")).unwrap();
        assert_eq!(json, r#"{"name":"Dune","status":"skipped","detail":"already in library"}"#);
    }
}
