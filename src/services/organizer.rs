//! Organizer service: configuration, one reconciliation run, shutdown
//!
//! A run validates the configuration, loads the Emby catalog, reconciles the
//! source directory and hands the report to the notification service. The
//! catalog is loaded fresh for every run and dropped when the run ends.
//!
//! Runs are serialized: while one is in progress any other trigger (cron,
//! HTTP, CLI) gets [OrganizeError::AlreadyRunning] instead of racing it on
//! the same directories.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use super::catalog::CatalogLoader;
use super::notifications::{Notification, NotificationService};
use super::reconciler::Reconciler;
use super::report::{ReportBuilder, RunReport};
use crate::config::Config;
use crate::error::OrganizeError;

/// What the scheduler should do after a configuration is applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPlan {
    /// Fire one run right away. Consumed by whoever receives the plan.
    pub run_now: bool,
    /// Cron expression for recurring runs, if enabled
    pub cron: Option<String>,
}

pub struct OrganizerService {
    config: RwLock<Config>,
    notifications: Arc<NotificationService>,
    run_gate: Mutex<()>,
}

impl OrganizerService {
    pub fn new(config: Config, notifications: Arc<NotificationService>) -> Self {
        Self {
            config: RwLock::new(config),
            notifications,
            run_gate: Mutex::new(()),
        }
    }

    pub fn notifications(&self) -> &Arc<NotificationService> {
        &self.notifications
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> Config {
        self.config.read().clone()
    }

    /// Replace the configuration and work out which triggers it asks for.
    ///
    /// The stored config keeps its `run_once` flag cleared; the request to
    /// run immediately only lives in the returned plan.
    pub fn configure(&self, mut config: Config) -> JobPlan {
        let plan = JobPlan {
            run_now: config.enabled && config.run_once,
            cron: (config.enabled && !config.cron.trim().is_empty()).then(|| config.cron.clone()),
        };
        config.run_once = false;

        info!(
            enabled = config.enabled,
            run_now = plan.run_now,
            cron = ?plan.cron,
            strategy = config.match_strategy.as_str(),
            "Organizer configured"
        );
        *self.config.write() = config;
        plan
    }

    /// Run one reconciliation pass.
    pub async fn run_once(&self) -> Result<RunReport, OrganizeError> {
        let Ok(_guard) = self.run_gate.try_lock() else {
            warn!("Reconciliation already running, ignoring trigger");
            return Err(OrganizeError::AlreadyRunning);
        };

        let run_id = Uuid::new_v4();
        self.run_locked()
            .instrument(info_span!("organize_run", %run_id))
            .await
    }

    async fn run_locked(&self) -> Result<RunReport, OrganizeError> {
        let config = self.config();

        if let Err(e) = config.validate() {
            error!(error = %e, "Configuration check failed, run not started");
            if config.notify {
                self.notifications.notify(Notification::config_failure(&e)).await;
            }
            return Err(e.into());
        }

        info!(
            source = %config.source_path.display(),
            target = %config.target_path.display(),
            "Starting reconciliation run"
        );

        let loader = CatalogLoader::new(&config.emby_url, &config.emby_api_key, config.match_strategy)
            .with_mapping(config.path_mapping.clone())
            .with_timeout(config.request_timeout);
        let catalog = loader.load().await;

        if let Some(ref e) = catalog.error
            && config.notify
        {
            self.notifications.notify(Notification::catalog_failure(e)).await;
        }

        let outcomes = Reconciler::new(&config.source_path, &config.target_path)
            .run(&catalog.index)
            .await?;
        let report = ReportBuilder::summarize(outcomes);

        info!(
            total = report.total,
            moved = report.moved,
            skipped = report.skipped,
            failed = report.failed,
            "Reconciliation run finished"
        );

        if config.notify
            && let Some(notification) = Notification::report(&report)
        {
            self.notifications.notify(notification).await;
        }

        Ok(report)
    }

    /// Wait for an in-flight run to finish. Later triggers are the
    /// scheduler's to stop.
    pub async fn shutdown(&self) {
        let _guard = self.run_gate.lock().await;
        info!("Organizer stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CRON;

    fn service(config: Config) -> OrganizerService {
        OrganizerService::new(config, Arc::new(NotificationService::with_defaults()))
    }

    #[test]
    fn test_configure_consumes_run_once() {
        let organizer = service(Config::default());
        let plan = organizer.configure(Config {
            enabled: true,
            run_once: true,
            ..Config::default()
        });

        assert_eq!(
            plan,
            JobPlan {
                run_now: true,
                cron: Some(DEFAULT_CRON.to_string()),
            }
        );
        assert!(!organizer.config().run_once);
    }

    #[test]
    fn test_configure_disabled_plans_nothing() {
        let organizer = service(Config::default());
        let plan = organizer.configure(Config {
            enabled: false,
            run_once: true,
            ..Config::default()
        });

        assert_eq!(
            plan,
            JobPlan {
                run_now: false,
                cron: None,
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_config_notifies_and_fails() {
        let organizer = service(Config::default());
        let mut rx = organizer.notifications().subscribe();

        let result = organizer.run_once().await;

        assert!(matches!(result, Err(OrganizeError::Config(_))));
        let notification = rx.recv().await.unwrap();
        assert_eq!(notification.title, "Movie organizer failed");
    }

    #[tokio::test]
    async fn test_concurrent_run_is_rejected() {
        let organizer = service(Config::default());
        let _held = organizer.run_gate.lock().await;

        assert!(matches!(
            organizer.run_once().await,
            Err(OrganizeError::AlreadyRunning)
        ));
    }
}
