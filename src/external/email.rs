use crate::config::EmailConfig;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

#[derive(Clone)]
pub struct EmailService {
    client: Client,
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.config.api_key.is_empty() && !self.config.from_address.is_empty()
    }

    pub async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        let url = format!("{}/v1/send", self.config.base_url.trim_end_matches('/'));

        let request = SendEmailRequest {
            from: &self.config.from_address,
            to,
            subject,
            text: body,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if response.status().is_success() {
            log::info!("Email sent: {to}");
            Ok(())
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("Failed to send email to {to}: {error_text}");
            Err(AppError::ExternalApiError(format!(
                "Email sending failed: {error_text}"
            )))
        }
    }

    /// 候补转正通知，附 24 小时购票截止时间
    pub async fn send_waitlist_promotion(
        &self,
        to: &str,
        event_name: &str,
        ticket_type_name: &str,
        quantity: i32,
        deadline: &chrono::DateTime<chrono::Utc>,
    ) -> AppResult<()> {
        let subject = format!("Tickets available: {event_name}");
        let body = format!(
            "Good news! {quantity} x {ticket_type_name} for {event_name} \
             {is_are} now reserved for you.\n\n\
             Complete your purchase before {deadline} (UTC) or the reservation \
             will be released to the next person in line.",
            is_are = if quantity == 1 { "is" } else { "are" },
            deadline = deadline.format("%Y-%m-%d %H:%M"),
        );
        self.send(to, &subject, &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_configured() {
        let svc = EmailService::new(EmailConfig {
            api_key: "key".to_string(),
            from_address: "noreply@stagepass.dev".to_string(),
            base_url: "https://api.mailchannel.dev".to_string(),
        });
        assert!(svc.is_configured());

        let svc = EmailService::new(EmailConfig::default());
        assert!(!svc.is_configured());
    }
}
