//! Job scheduling for recurring reconciliation runs

pub mod organize;

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::info;

use crate::services::OrganizerService;

/// Convert a 5-field crontab expression into the 6-field form (with seconds)
/// the scheduler expects. Other forms are passed through untouched.
pub fn normalize_cron(expr: &str) -> String {
    let expr = expr.trim();
    if expr.split_whitespace().count() == 5 {
        format!("0 {}", expr)
    } else {
        expr.to_string()
    }
}

/// Initialize and start the job scheduler with the recurring organize job
pub async fn start_scheduler(
    organizer: Arc<OrganizerService>,
    cron: &str,
) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;
    let schedule = normalize_cron(cron);

    let organize_job = Job::new_async(schedule.as_str(), move |_uuid, _l| {
        let organizer = organizer.clone();
        Box::pin(async move {
            info!("Running scheduled movie organize");
            if let Err(e) = organize::run_organize(organizer).await {
                tracing::error!("Organize job error: {}", e);
            }
        })
    })?;
    scheduler.add(organize_job).await?;

    scheduler.start().await?;

    info!(schedule = %schedule, "Job scheduler started");
    Ok(scheduler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_five_field_cron() {
        assert_eq!(normalize_cron("0 2 * * *"), "0 0 2 * * *");
        assert_eq!(normalize_cron("  */30 * * * * "), "0 */30 * * * *");
    }

    #[test]
    fn test_six_field_cron_passes_through() {
        assert_eq!(normalize_cron("0 0 3 * * *"), "0 0 3 * * *");
    }
}
