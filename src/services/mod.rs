//! Organizer services and the Emby integration

pub mod catalog;
pub mod emby;
pub mod file_utils;
pub mod filename_parser;
pub mod logging;
pub mod mover;
pub mod notifications;
pub mod organizer;
pub mod reconciler;
pub mod report;

pub use catalog::{CatalogEntry, CatalogIndex, CatalogLoad, CatalogLoader};
pub use emby::{EmbyClient, EmbyItem};
pub use logging::{LogFormat, init_tracing};
pub use notifications::{
    Notification, NotificationService, NotificationServiceConfig, NotificationSink, WebhookSink,
};
pub use organizer::{JobPlan, OrganizerService};
pub use reconciler::{CandidateItem, Reconciler};
pub use report::{OutcomeRecord, OutcomeStatus, ReportBuilder, RunReport};
