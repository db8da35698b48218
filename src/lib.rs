//! Emby organizer
//!
//! Reconciles a directory of movie folders against an Emby server's catalog
//! and moves folders the server doesn't know about into a holding directory,
//! on a cron schedule or on demand.

pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod jobs;
pub mod services;
