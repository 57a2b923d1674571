//! Background compliance jobs.
//!
//! Three independently controllable jobs: draining scheduled notifications,
//! the daily overdue-document scan, and notification retention cleanup.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod workers;

pub use models::ScheduleSettings;
pub use routes::routes;
pub use services::ComplianceScheduler;
pub use workers::ComplianceJobs;
