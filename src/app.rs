//! Daemon composition: notifications, organizer, scheduler and control API.

use std::sync::Arc;

use anyhow::Result;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::JobScheduler;
use tracing::{error, info, warn};

use crate::api::{self, ApiState};
use crate::config::Config;
use crate::jobs;
use crate::services::{Notification, NotificationService, OrganizerService, WebhookSink};

/// Build the notification service with the sinks the config asks for
pub fn build_notifications(config: &Config) -> Result<Arc<NotificationService>> {
    let mut notifications = NotificationService::with_defaults();
    if let Some(ref url) = config.webhook_url {
        notifications = notifications.with_sink(Arc::new(WebhookSink::new(url.clone())?));
        info!("Webhook notifications enabled");
    }
    Ok(Arc::new(notifications))
}

/// Start recurring runs. A rejected cron expression is logged and notified,
/// and the daemon carries on with the API and one-shot triggers only.
async fn schedule_runs(organizer: &Arc<OrganizerService>, cron: &str) -> Option<JobScheduler> {
    match jobs::start_scheduler(organizer.clone(), cron).await {
        Ok(scheduler) => Some(scheduler),
        Err(e) => {
            error!(cron, error = %e, "Failed to schedule organize runs");
            if organizer.config().notify {
                organizer
                    .notifications()
                    .notify(Notification::schedule_failure(cron, &e))
                    .await;
            }
            None
        }
    }
}

/// A running organizer daemon
pub struct App {
    organizer: Arc<OrganizerService>,
    scheduler: Option<JobScheduler>,
    api_handle: Option<JoinHandle<()>>,
}

impl App {
    /// Apply the configuration and start whatever it enables.
    pub async fn start(config: Config) -> Result<Self> {
        let notifications = build_notifications(&config)?;
        let http_port = config.http_port;

        let organizer = Arc::new(OrganizerService::new(Config::default(), notifications));
        let plan = organizer.configure(config);

        if plan.run_now {
            info!("Immediate run requested");
            let organizer = organizer.clone();
            tokio::spawn(async move {
                if let Err(e) = jobs::organize::run_organize(organizer).await {
                    tracing::error!("Immediate organize run failed: {}", e);
                }
            });
        }

        let scheduler = match plan.cron {
            Some(ref cron) => schedule_runs(&organizer, cron).await,
            None => {
                info!("Scheduled runs disabled");
                None
            }
        };

        let api_handle = http_port.map(|port| {
            let state = ApiState {
                organizer: organizer.clone(),
            };
            tokio::spawn(async move {
                if let Err(e) = api::serve(state, port).await {
                    tracing::error!("Control API stopped: {}", e);
                }
            })
        });

        Ok(Self {
            organizer,
            scheduler,
            api_handle,
        })
    }

    /// Stop the scheduler and API, then wait for an in-flight run.
    pub async fn shutdown(mut self) {
        if let Some(mut scheduler) = self.scheduler.take()
            && let Err(e) = scheduler.shutdown().await
        {
            warn!(error = %e, "Failed to stop job scheduler");
        }
        if let Some(handle) = self.api_handle.take() {
            handle.abort();
        }
        self.organizer.shutdown().await;
    }
}
