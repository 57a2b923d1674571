//! Document audit trail.
//!
//! Every upload, review decision and deletion leaves an entry. Recording is
//! fire-and-forget: a failing sink is logged and never rolls back the
//! mutation that triggered it.

pub mod models;
pub mod repositories;

pub use models::{AuditAction, NewAuditEntry};
pub use repositories::{track, AuditSink, PgAuditSink};
