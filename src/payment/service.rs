//! Payment processor client

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the payment processor
#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Payment processor unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Payment processor rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Payment intent as returned by the processor
#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub client_secret: Option<String>,
}

/// Refund confirmation as returned by the processor
#[derive(Debug, Serialize, Deserialize)]
pub struct Refund {
    pub id: String,
    pub status: String,
}

/// Client for the Stripe-shaped payment API
pub struct PaymentService {
    http: reqwest::Client,
    api_url: String,
    secret_key: String,
}

impl PaymentService {
    /// Create a new payment service instance
    pub fn new(api_url: String, secret_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url,
            secret_key,
        }
    }

    /// Create a payment intent for an upfront deposit
    pub async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        let response = self
            .http
            .post(format!("{}/v1/payment_intents", self.api_url))
            .bearer_auth(&self.secret_key)
            .form(&[("amount", amount.to_string()), ("currency", currency.to_string())])
            .send()
            .await?;

        Self::parse(response).await
    }

    /// Refund a captured payment
    pub async fn refund(&self, payment_id: &str) -> Result<Refund, PaymentError> {
        let response = self
            .http
            .post(format!("{}/v1/refunds", self.api_url))
            .bearer_auth(&self.secret_key)
            .form(&[("payment_intent", payment_id)])
            .send()
            .await?;

        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, PaymentError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<T>().await?)
    }
}
