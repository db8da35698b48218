//! Movie organize job

use std::sync::Arc;

use anyhow::Result;

use crate::error::OrganizeError;
use crate::services::OrganizerService;

/// Run one organize pass from a trigger. An overlapping trigger is not an
/// error: the run already in progress covers it.
pub async fn run_organize(organizer: Arc<OrganizerService>) -> Result<()> {
    match organizer.run_once().await {
        Ok(_) | Err(OrganizeError::AlreadyRunning) => Ok(()),
        // Already logged and notified by the service
        Err(OrganizeError::Config(_)) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
