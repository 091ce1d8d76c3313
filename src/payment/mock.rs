//! Offline stand-in for the card SDK, driven by well-known test card numbers.

use std::{
    collections::HashSet,
    sync::{Mutex, PoisonError},
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    error::{AppError, AppResult},
    models::PaymentIntentStatus,
    payment::{
        CardDetails,
        adapter::UNEXPECTED_STATE_CODE,
        provider::{ConfirmOutcome, ConfirmedIntent, PaymentProvider, intent_id_from_secret},
    },
};

pub const CARD_SUCCESS: &str = "4242424242424242";
pub const CARD_DECLINED: &str = "4000000000000002";
pub const CARD_INSUFFICIENT_FUNDS: &str = "4000000000009995";
pub const CARD_EXPIRED: &str = "4000000000000069";
pub const CARD_REQUIRES_ACTION: &str = "4000000000003220";

#[derive(Default)]
pub struct MockProvider {
    latency: Option<Duration>,
    succeeded: Mutex<HashSet<String>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every confirmation, to mimic a network round trip.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn outcome_for(number: &str, last4: &str, intent_id: &str) -> ConfirmOutcome {
        let decline = |message: &str, code: &str| ConfirmOutcome::Error {
            message: message.to_string(),
            code: Some(code.to_string()),
        };
        match number {
            CARD_DECLINED => decline("Your card was declined.", "card_declined"),
            CARD_INSUFFICIENT_FUNDS => {
                decline("Your card has insufficient funds.", "insufficient_funds")
            }
            CARD_EXPIRED => decline("Your card has expired.", "expired_card"),
            CARD_REQUIRES_ACTION => ConfirmOutcome::Confirmed(ConfirmedIntent {
                id: intent_id.to_string(),
                status: PaymentIntentStatus::RequiresAction,
                payment_method_id: None,
            }),
            _ => ConfirmOutcome::Confirmed(ConfirmedIntent {
                id: intent_id.to_string(),
                status: PaymentIntentStatus::Succeeded,
                payment_method_id: Some(format!("pm_mock_{last4}")),
            }),
        }
    }
}

#[async_trait]
impl PaymentProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        card: &CardDetails,
    ) -> AppResult<ConfirmOutcome> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let intent_id = intent_id_from_secret(client_secret).ok_or_else(|| {
            AppError::Validation("The payment session is invalid. Reload the page.".to_string())
        })?;

        {
            let succeeded = self.succeeded.lock().unwrap_or_else(PoisonError::into_inner);
            if succeeded.contains(client_secret) {
                return Ok(ConfirmOutcome::Error {
                    message: "This payment has already been completed.".to_string(),
                    code: Some(UNEXPECTED_STATE_CODE.to_string()),
                });
            }
        }

        let number = card.normalized_number();
        if number.len() < 4 {
            return Ok(ConfirmOutcome::Error {
                message: "Your card number is incomplete.".to_string(),
                code: Some("incomplete_number".to_string()),
            });
        }

        let outcome = Self::outcome_for(&number, &card.last4(), intent_id);
        if let ConfirmOutcome::Confirmed(ConfirmedIntent {
            status: PaymentIntentStatus::Succeeded,
            ..
        }) = &outcome
        {
            self.succeeded
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(client_secret.to_string());
        }
        tracing::debug!(intent_id, last4 = %card.last4(), "mock confirmation");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(number: &str) -> CardDetails {
        CardDetails::new(number, 12, 2030, "123")
    }

    #[tokio::test]
    async fn success_card_confirms() {
        let provider = MockProvider::new();
        let outcome = provider
            .confirm_card_payment("pi_1_secret_x", &card(CARD_SUCCESS))
            .await
            .unwrap();
        match outcome {
            ConfirmOutcome::Confirmed(intent) => {
                assert_eq!(intent.id, "pi_1");
                assert_eq!(intent.status, PaymentIntentStatus::Succeeded);
                assert_eq!(intent.payment_method_id.as_deref(), Some("pm_mock_4242"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn declined_card_reports_reason() {
        let provider = MockProvider::new();
        let outcome = provider
            .confirm_card_payment("pi_1_secret_x", &card(CARD_DECLINED))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ConfirmOutcome::Error {
                message: "Your card was declined.".into(),
                code: Some("card_declined".into()),
            }
        );
    }

    #[tokio::test]
    async fn client_secret_is_single_use_after_success() {
        let provider = MockProvider::new();
        provider
            .confirm_card_payment("pi_1_secret_x", &card(CARD_SUCCESS))
            .await
            .unwrap();
        let second = provider
            .confirm_card_payment("pi_1_secret_x", &card(CARD_SUCCESS))
            .await
            .unwrap();
        assert!(matches!(second, ConfirmOutcome::Error { .. }));
    }

    #[tokio::test]
    async fn requires_action_is_not_success() {
        let provider = MockProvider::new();
        let outcome = provider
            .confirm_card_payment("pi_1_secret_x", &card(CARD_REQUIRES_ACTION))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            ConfirmOutcome::Confirmed(ConfirmedIntent {
                status: PaymentIntentStatus::RequiresAction,
                ..
            })
        ));
    }
}
