use async_trait::async_trait;
use serde::Serialize;

use crate::core::error::Result;

/// A rendered message ready for the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Port for outbound email.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Hand a message to the transport.
    ///
    /// `Ok(false)` means the transport refused the message; `Err` means it
    /// could not be reached at all.
    async fn send(&self, mail: &OutgoingMail) -> Result<bool>;
}
