//! Notification service for run reports and failures
//!
//! Every notification is logged and broadcast to in-process subscribers.
//! Additional sinks (e.g. a webhook) can be registered; a failing sink is
//! logged and never affects the run that produced the notification.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::report::RunReport;
use crate::error::{CatalogError, ConfigError};

/// A title/body pair handed to the notification sinks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// The run could not start because of configuration problems
    pub fn config_failure(err: &ConfigError) -> Self {
        Self::new("Movie organizer failed", format!("Errors: {}", err.summary()))
    }

    /// The catalog could not be loaded; the run continues without it
    pub fn catalog_failure(err: &CatalogError) -> Self {
        Self::new(
            "Emby catalog unavailable",
            format!(
                "{}\nEvery movie folder is treated as not yet in the library for this run.",
                err
            ),
        )
    }

    /// The cron expression was rejected; only manual triggers remain
    pub fn schedule_failure(cron: &str, err: &anyhow::Error) -> Self {
        Self::new(
            "Movie organizer failed",
            format!("Invalid cron expression '{}': {}\nScheduled runs are disabled.", cron, err),
        )
    }

    /// Summary of a completed run. Returns [None] when nothing was found.
    pub fn report(report: &RunReport) -> Option<Self> {
        if report.total == 0 {
            return None;
        }

        let mut body = format!(
            "Organize complete:\n  Total: {}\n  Moved: {}\n  Already in library: {}\n  Failed: {}",
            report.total, report.moved, report.skipped, report.failed
        );

        if report.failed > 0 {
            let failures = report
                .failures()
                .map(|d| format!("{}: {}", d.name, d.detail.as_deref().unwrap_or("unknown error")))
                .collect::<Vec<_>>()
                .join("\n");
            body.push_str("\nFailures:\n");
            body.push_str(&failures);
        }

        Some(Self::new("Movie organizer report", body))
    }
}

/// Destination for notifications
#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    fn name(&self) -> &str;

    async fn send(&self, notification: &Notification) -> Result<()>;
}

/// Posts notifications as JSON to a webhook URL
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, notification: &Notification) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .context("Webhook request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Webhook returned status {}", response.status());
        }
        Ok(())
    }
}

/// Notification service configuration
#[derive(Debug, Clone)]
pub struct NotificationServiceConfig {
    /// Broadcast channel capacity
    pub channel_capacity: usize,
}

impl Default for NotificationServiceConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
        }
    }
}

/// Fans notifications out to subscribers and registered sinks
pub struct NotificationService {
    event_tx: broadcast::Sender<Notification>,
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl NotificationService {
    pub fn new(config: NotificationServiceConfig) -> Self {
        let (event_tx, _) = broadcast::channel(config.channel_capacity);
        Self {
            event_tx,
            sinks: Vec::new(),
        }
    }

    /// Create with default configuration
    pub fn with_defaults() -> Self {
        Self::new(NotificationServiceConfig::default())
    }

    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Subscribe to notifications
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.event_tx.subscribe()
    }

    pub async fn notify(&self, notification: Notification) {
        info!(title = %notification.title, "{}", notification.body);

        // No subscribers is fine
        let _ = self.event_tx.send(notification.clone());

        for sink in &self.sinks {
            if let Err(e) = sink.send(&notification).await {
                warn!(sink = sink.name(), error = %e, "Failed to deliver notification");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigProblem;
    use crate::services::report::{OutcomeRecord, ReportBuilder};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_report_body_without_failures() {
        let report = ReportBuilder::summarize(vec![
            OutcomeRecord::moved("Alien", "/hold/Alien (1979)"),
            OutcomeRecord::skipped("Dune", "already in library"),
        ]);
        let n = Notification::report(&report).unwrap();

        assert_eq!(n.title, "Movie organizer report");
        assert_eq!(
            n.body,
            "Organize complete:\n  Total: 2\n  Moved: 1\n  Already in library: 1\n  Failed: 0"
        );
    }

    #[test]
    fn test_report_body_lists_failures() {
        let report = ReportBuilder::summarize(vec![
            OutcomeRecord::failed("Heat", "permission denied"),
            OutcomeRecord::moved("Alien", "/hold/Alien (1979)"),
            OutcomeRecord::failed("Up", "destination already exists: /hold/Up"),
        ]);
        let n = Notification::report(&report).unwrap();

        assert!(n.body.ends_with(
            "Failed: 2\nFailures:\nHeat: permission denied\nUp: destination already exists: /hold/Up"
        ));
    }

    #[test]
    fn test_empty_report_sends_nothing() {
        assert_eq!(Notification::report(&RunReport::default()), None);
    }

    #[test]
    fn test_config_failure_message() {
        let err = ConfigError {
            problems: vec![ConfigProblem::MissingApiKey],
        };
        let n = Notification::config_failure(&err);
        assert_eq!(n.title, "Movie organizer failed");
        assert_eq!(n.body, "Errors: Emby API key is not configured");
    }

    struct FailingSink;

    #[async_trait]
    impl NotificationSink for FailingSink {
        fn name(&self) -> &str {
            "failing"
        }

        async fn send(&self, _notification: &Notification) -> Result<()> {
            anyhow::bail!("unreachable")
        }
    }

    struct CountingSink(AtomicUsize);

    #[async_trait]
    impl NotificationSink for CountingSink {
        fn name(&self) -> &str {
            "counting"
        }

        async fn send(&self, _notification: &Notification) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_block_others() {
        let counter = Arc::new(CountingSink(AtomicUsize::new(0)));
        let service = NotificationService::with_defaults()
            .with_sink(Arc::new(FailingSink))
            .with_sink(counter.clone());
        let mut rx = service.subscribe();

        service.notify(Notification::new("t", "b")).await;

        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        assert_eq!(rx.recv().await.unwrap(), Notification::new("t", "b"));
    }
}
