use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;

#[derive(Debug, Clone)]
pub struct EmailAttachment {
    pub filename: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment: Option<EmailAttachment>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("http error: {0}")]
    Http(String),

    #[error("mail api returned status {0}")]
    Api(u16),
}

/// Outbound user notification. Production delivery goes through a
/// transactional mail HTTP API; tests record messages in memory.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError>;
}

pub struct MailApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    from: String,
}

impl MailApiClient {
    pub fn new(base_url: String, api_key: String, from: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("failed to build http client");

        Self {
            client,
            base_url,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Notifier for MailApiClient {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        let url = format!("{}/v1/send", self.base_url);

        let attachments: Vec<serde_json::Value> = message
            .attachment
            .iter()
            .map(|a| {
                serde_json::json!({
                    "filename": a.filename,
                    "content": STANDARD.encode(&a.content),
                })
            })
            .collect();

        let body = serde_json::json!({
            "from": self.from,
            "to": message.to,
            "subject": message.subject,
            "text": message.body,
            "attachments": attachments,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::Api(response.status().as_u16()));
        }

        tracing::debug!("mail sent to {}: {}", message.to, message.subject);
        Ok(())
    }
}
