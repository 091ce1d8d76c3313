//! Card confirmation against the Stripe REST API, the way the browser SDK does it:
//! publishable key plus the intent's client secret.

use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::PaymentIntentStatus,
    payment::{
        CardDetails,
        provider::{ConfirmOutcome, ConfirmedIntent, PaymentProvider, intent_id_from_secret},
    },
};

#[derive(Clone)]
pub struct StripeProvider {
    http: reqwest::Client,
    publishable_key: String,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct StripeIntent {
    id: String,
    status: PaymentIntentStatus,
    #[serde(default)]
    payment_method: Option<serde_json::Value>,
    #[serde(default)]
    last_payment_error: Option<StripeErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
    code: Option<String>,
    decline_code: Option<String>,
}

impl StripeProvider {
    pub fn new(
        publishable_key: impl Into<String>,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow!("failed to build Stripe client: {e}")))?;
        Ok(Self {
            http,
            publishable_key: publishable_key.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    fn confirm_form(client_secret: &str, card: &CardDetails) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("client_secret", client_secret.to_string()),
            ("payment_method_data[type]", "card".to_string()),
            ("payment_method_data[card][number]", card.normalized_number()),
            ("payment_method_data[card][exp_month]", card.exp_month.to_string()),
            ("payment_method_data[card][exp_year]", card.exp_year.to_string()),
            ("payment_method_data[card][cvc]", card.cvc.trim().to_string()),
        ];
        if let Some(postal) = card.postal_code.as_ref().filter(|p| !p.trim().is_empty()) {
            form.push((
                "payment_method_data[billing_details][address][postal_code]",
                postal.trim().to_string(),
            ));
        }
        form
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    fn name(&self) -> &'static str {
        "stripe"
    }

    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        card: &CardDetails,
    ) -> AppResult<ConfirmOutcome> {
        let intent_id = intent_id_from_secret(client_secret).ok_or_else(|| {
            AppError::Validation("The payment session is invalid. Reload the page.".to_string())
        })?;
        let url = format!("{}/payment_intents/{}/confirm", self.api_base, intent_id);

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.publishable_key)
            .form(&Self::confirm_form(client_secret, card))
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, intent_id, "stripe confirmation did not complete");
                AppError::TransientNetwork("could not reach the payment provider".to_string())
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::TransientNetwork(e.to_string()))?;

        if status.is_success() {
            let intent: StripeIntent = serde_json::from_slice(&body)?;
            if let Some(err) = intent.last_payment_error.filter(|_| {
                intent.status == PaymentIntentStatus::RequiresPaymentMethod
            }) {
                return Ok(decline_from(err));
            }
            let payment_method_id = intent.payment_method.and_then(|pm| match pm {
                serde_json::Value::String(id) => Some(id),
                serde_json::Value::Object(obj) => obj
                    .get("id")
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
                _ => None,
            });
            return Ok(ConfirmOutcome::Confirmed(ConfirmedIntent {
                id: intent.id,
                status: intent.status,
                payment_method_id,
            }));
        }

        match status {
            StatusCode::PAYMENT_REQUIRED | StatusCode::BAD_REQUEST => {
                let err: StripeErrorBody = serde_json::from_slice(&body)?;
                Ok(decline_from(err.error))
            }
            StatusCode::TOO_MANY_REQUESTS => Err(AppError::TransientNetwork(
                "the payment provider is busy".to_string(),
            )),
            s => {
                tracing::error!(status = %s, intent_id, "stripe rejected confirmation");
                Err(AppError::Upstream { status: s.as_u16() })
            }
        }
    }
}

fn decline_from(err: StripeErrorDetail) -> ConfirmOutcome {
    ConfirmOutcome::Error {
        message: err
            .message
            .unwrap_or_else(|| "Your card was declined.".to_string()),
        code: err.decline_code.or(err.code),
    }
}
