use std::{sync::Arc, time::Duration};

use anyhow::anyhow;

use crate::{
    api::PaymentService,
    config::PaymentProviderConfig,
    dto::payments::CreatePaymentIntentRequest,
    error::{AppError, AppResult},
    models::{PaymentIntent, PaymentIntentStatus},
    payment::{
        CardDetails, MockProvider, StripeProvider,
        provider::{ConfirmOutcome, PaymentProvider},
    },
};

/// Provider error code for a confirmation against an intent that is already settled or spent.
pub const UNEXPECTED_STATE_CODE: &str = "payment_intent_unexpected_state";

#[derive(Debug, Clone, Copy, Default)]
pub struct IntentOptions {
    pub setup_future_usage: bool,
}

/// Proof that a charge was confirmed by the provider and recorded by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub intent_id: String,
    pub booking_id: String,
    pub payment_method_id: Option<String>,
    pub amount: i64,
}

/// A charge the provider confirmed but the backend has not recorded yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedCharge {
    pub intent_id: String,
    pub booking_id: String,
    /// As reported by the provider; `None` when it did not name one.
    pub payment_method_id: Option<String>,
    pub amount: i64,
    pub save_card: bool,
}

/// One payment interface over whichever provider was configured.
#[derive(Clone)]
pub struct PaymentAdapter {
    provider: Arc<dyn PaymentProvider>,
    payments: PaymentService,
}

impl PaymentAdapter {
    pub fn new(provider: Arc<dyn PaymentProvider>, payments: PaymentService) -> Self {
        Self { provider, payments }
    }

    pub fn from_config(
        config: &PaymentProviderConfig,
        payments: PaymentService,
        timeout: Duration,
    ) -> AppResult<Self> {
        let provider: Arc<dyn PaymentProvider> = match config {
            PaymentProviderConfig::Mock => Arc::new(MockProvider::new()),
            PaymentProviderConfig::Stripe {
                publishable_key,
                api_base,
            } => Arc::new(StripeProvider::new(
                publishable_key.clone(),
                api_base.clone(),
                timeout,
            )?),
        };
        tracing::info!(provider = provider.name(), "payment provider selected");
        Ok(Self::new(provider, payments))
    }

    pub async fn create_intent(
        &self,
        booking_id: &str,
        options: IntentOptions,
    ) -> AppResult<PaymentIntent> {
        let request = CreatePaymentIntentRequest {
            setup_future_usage: options.setup_future_usage.then_some(true),
        };
        let intent = self
            .payments
            .create_payment_intent(booking_id, &request)
            .await
            .map_err(|err| match err {
                AppError::NotFound(_) | AppError::Forbidden(_) => {
                    AppError::IntentCreation("this booking could not be found".to_string())
                }
                AppError::Rejected { message, .. } => AppError::IntentCreation(message),
                other => other,
            })?;

        if intent.booking_id != booking_id {
            return Err(AppError::Internal(anyhow!(
                "payment intent {} belongs to booking {}, expected {}",
                intent.id,
                intent.booking_id,
                booking_id
            )));
        }
        tracing::info!(booking_id, intent_id = %intent.id, "payment intent created");
        Ok(intent)
    }

    pub async fn confirm_card_payment(
        &self,
        client_secret: &str,
        card: &CardDetails,
    ) -> AppResult<ConfirmOutcome> {
        self.provider.confirm_card_payment(client_secret, card).await
    }

    /// Validates the card and confirms it with the provider.
    ///
    /// Only a `Succeeded` status yields a charge. Errors are `Validation`
    /// (bad card fields, nothing sent), `PaymentDeclined` (nothing charged,
    /// safe to retry on the same intent), `IntentExpired` (the intent is
    /// spent and a new one must be created) or a transport error.
    pub async fn confirm_charge(
        &self,
        intent: &PaymentIntent,
        card: &CardDetails,
        save_card: bool,
    ) -> AppResult<ConfirmedCharge> {
        card.validate()?;

        let confirmed = match self.confirm_card_payment(&intent.client_secret, card).await? {
            ConfirmOutcome::Error { code, .. }
                if code.as_deref() == Some(UNEXPECTED_STATE_CODE) =>
            {
                tracing::warn!(intent_id = %intent.id, "intent no longer accepts confirmation");
                return Err(intent_expired());
            }
            ConfirmOutcome::Error { message, code } => {
                tracing::info!(
                    intent_id = %intent.id,
                    code = code.as_deref().unwrap_or("-"),
                    "card declined"
                );
                return Err(AppError::PaymentDeclined(message));
            }
            ConfirmOutcome::Confirmed(confirmed) => confirmed,
        };

        if matches!(
            confirmed.status,
            PaymentIntentStatus::Canceled | PaymentIntentStatus::Failed
        ) {
            tracing::warn!(
                intent_id = %intent.id,
                status = confirmed.status.as_str(),
                "intent ended without a charge"
            );
            return Err(intent_expired());
        }
        if confirmed.status != PaymentIntentStatus::Succeeded {
            tracing::warn!(
                intent_id = %intent.id,
                status = confirmed.status.as_str(),
                "confirmation finished without success"
            );
            return Err(AppError::PaymentDeclined(format!(
                "Your payment was not completed (status: {}). Please try again.",
                confirmed.status.as_str()
            )));
        }

        Ok(ConfirmedCharge {
            intent_id: intent.id.clone(),
            booking_id: intent.booking_id.clone(),
            payment_method_id: confirmed.payment_method_id,
            amount: intent.amount,
            save_card,
        })
    }

    /// Reports a provider-confirmed charge to the backend. Safe to call again for the same charge.
    ///
    /// When the provider did not name the payment method, the intent id is
    /// sent in its place.
    pub async fn reconcile(&self, charge: &ConfirmedCharge) -> AppResult<PaymentReceipt> {
        let payment_method = charge
            .payment_method_id
            .as_deref()
            .unwrap_or(&charge.intent_id);
        match self
            .payments
            .process_payment(&charge.intent_id, payment_method, charge.save_card)
            .await
        {
            Ok(_) => {
                tracing::info!(
                    intent_id = %charge.intent_id,
                    booking_id = %charge.booking_id,
                    "payment recorded"
                );
                Ok(PaymentReceipt {
                    intent_id: charge.intent_id.clone(),
                    booking_id: charge.booking_id.clone(),
                    payment_method_id: charge.payment_method_id.clone(),
                    amount: charge.amount,
                })
            }
            Err(err) => {
                tracing::error!(
                    intent_id = %charge.intent_id,
                    booking_id = %charge.booking_id,
                    error = %err,
                    "charge confirmed but not recorded"
                );
                let message = if matches!(err, AppError::AuthRequired) {
                    "Your payment went through, but your session expired before we could record it. \
                     Sign in again to finish, or contact support"
                } else {
                    "Your payment went through, but we couldn't record it. Please contact support"
                };
                Err(AppError::Reconciliation {
                    reference: charge.intent_id.clone(),
                    message: message.to_string(),
                })
            }
        }
    }
}

fn intent_expired() -> AppError {
    AppError::IntentExpired(
        "This payment session can no longer be used. Start again to get a new one.".to_string(),
    )
}
