use async_trait::async_trait;

use crate::core::error::Result;
use crate::features::tracking::models::NewAuditEntry;

/// Port for the append-only audit trail.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: NewAuditEntry) -> Result<()>;
}

/// Record an entry, logging instead of failing when the sink is unavailable
pub async fn track(sink: &dyn AuditSink, entry: NewAuditEntry) {
    let action = entry.action;
    let document_id = entry.document_id;

    if let Err(e) = sink.record(entry).await {
        tracing::warn!(
            "Failed to record audit entry (action={:?}, document={:?}): {}",
            action,
            document_id,
            e
        );
    }
}
