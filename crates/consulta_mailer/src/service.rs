use consulta_common::services::{BoxFuture, EmailProvider, ProviderError, ReminderMessage};
use consulta_common::HTTP_CLIENT;
use consulta_config::MailerConfig;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use crate::error::MailerError;
use crate::templates::render_reminder;

/// Sends reminder emails through SendGrid
pub struct SendGridEmailProvider {
    config: Arc<MailerConfig>,
}

impl SendGridEmailProvider {
    pub fn new(config: Arc<MailerConfig>) -> Self {
        Self { config }
    }

    async fn send(&self, message: &ReminderMessage) -> Result<(), MailerError> {
        if self.config.api_key.is_empty() {
            return Err(MailerError::ConfigError("mailer.api_key is empty".to_string()));
        }

        let email = render_reminder(message);
        let mut to = json!({ "email": message.to_email });
        if let Some(name) = &message.to_name {
            to["name"] = json!(name);
        }
        let mut from = json!({ "email": self.config.from_email });
        if let Some(name) = &self.config.from_name {
            from["name"] = json!(name);
        }

        let body = json!({
            "personalizations": [{ "to": [to] }],
            "from": from,
            "subject": email.subject,
            "content": [
                { "type": "text/plain", "value": email.text },
                { "type": "text/html", "value": email.html }
            ]
        });

        let url = format!("{}/v3/mail/send", self.config.api_base.trim_end_matches('/'));
        let resp = HTTP_CLIENT
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            error!("SendGrid returned {}: {}", status, text);
            return Err(MailerError::ApiError {
                status_code: status.as_u16(),
                message: text,
            });
        }

        info!(
            "Sent {} reminder to {}",
            message.lead_time_tag, message.to_email
        );
        Ok(())
    }
}

impl EmailProvider for SendGridEmailProvider {
    fn send_reminder(&self, message: ReminderMessage) -> BoxFuture<'_, (), ProviderError> {
        Box::pin(async move { Ok(self.send(&message).await?) })
    }
}
