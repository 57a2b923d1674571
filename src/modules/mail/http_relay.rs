use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::core::config::MailConfig;
use crate::core::error::{AppError, Result};
use crate::modules::mail::{MailTransport, OutgoingMail};

#[derive(Debug, Serialize)]
struct RelayRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Mail transport posting JSON messages to an HTTP mail relay
pub struct HttpMailRelay {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    from_address: String,
}

impl HttpMailRelay {
    pub fn new(api_url: String, config: &MailConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url,
            api_key: config.api_key.clone(),
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl MailTransport for HttpMailRelay {
    async fn send(&self, mail: &OutgoingMail) -> Result<bool> {
        let mut request = self.client.post(&self.api_url).json(&RelayRequest {
            from: &self.from_address,
            to: &mail.to,
            subject: &mail.subject,
            text: &mail.body,
        });

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Delivery(format!("Mail relay unreachable: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!("Mail to {} accepted by relay", mail.to);
            return Ok(true);
        }

        if status.is_server_error() {
            return Err(AppError::Delivery(format!(
                "Mail relay returned HTTP {}",
                status
            )));
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!("Mail relay refused message to {}: {} {}", mail.to, status, body);
        Ok(false)
    }
}

/// Transport used when no relay is configured; every send fails
pub struct DisabledMailTransport;

#[async_trait]
impl MailTransport for DisabledMailTransport {
    async fn send(&self, mail: &OutgoingMail) -> Result<bool> {
        Err(AppError::Delivery(format!(
            "Mail relay not configured, cannot send to {}",
            mail.to
        )))
    }
}
