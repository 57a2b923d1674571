mod audit_sink;
mod pg_audit_sink;

pub use audit_sink::{track, AuditSink};
pub use pg_audit_sink::PgAuditSink;
