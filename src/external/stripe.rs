use crate::config::StripeConfig;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
    pub amount: i64,
    pub status: String,
}

impl PaymentIntent {
    pub fn is_succeeded(&self) -> bool {
        self.status == "succeeded"
    }
}

#[derive(Clone)]
pub struct StripeService {
    client: Client,
    config: StripeConfig,
}

impl StripeService {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// 创建支付意图。metadata 里带上用户与用途，方便在 Stripe 后台对账。
    pub async fn create_payment_intent(
        &self,
        amount: i64,
        user_id: i64,
        purpose: &str,
        description: Option<String>,
    ) -> AppResult<PaymentIntent> {
        let url = "https://api.stripe.com/v1/payment_intents";

        let mut params = vec![
            ("amount", amount.to_string()),
            ("currency", "usd".to_string()),
            ("metadata[user_id]", user_id.to_string()),
            ("metadata[purpose]", purpose.to_string()),
        ];
        if let Some(desc) = description {
            params.push(("description", desc));
        }

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.secret_key)
            .form(&params)
            .send()
            .await?;

        if response.status().is_success() {
            let payment_intent: PaymentIntent = response.json().await?;
            Ok(payment_intent)
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("Failed to create payment intent: {error_text}");
            Err(AppError::ExternalApiError(
                "Failed to create payment intent".to_string(),
            ))
        }
    }

    pub async fn retrieve_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> AppResult<PaymentIntent> {
        let url = format!(
            "https://api.stripe.com/v1/payment_intents/{}",
            payment_intent_id
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.secret_key)
            .send()
            .await?;

        if response.status().is_success() {
            let payment_intent: PaymentIntent = response.json().await?;
            Ok(payment_intent)
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("Failed to retrieve payment intent {payment_intent_id}: {error_text}");
            Err(AppError::ExternalApiError(
                "Failed to retrieve payment intent".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_intent_status() {
        let pi = PaymentIntent {
            id: "pi_123".to_string(),
            client_secret: "pi_123_secret".to_string(),
            amount: 1000,
            status: "succeeded".to_string(),
        };
        assert!(pi.is_succeeded());

        let pi = PaymentIntent {
            status: "requires_payment_method".to_string(),
            ..pi
        };
        assert!(!pi.is_succeeded());
    }
}
