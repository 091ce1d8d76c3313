use async_trait::async_trait;

use crate::{error::AppResult, models::PaymentIntentStatus, payment::CardDetails};

/// What the provider said about a confirmation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmOutcome {
    /// The provider refused the card; `message` is meant for the user.
    Error {
        message: String,
        code: Option<String>,
    },
    Confirmed(ConfirmedIntent),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedIntent {
    pub id: String,
    pub status: PaymentIntentStatus,
    pub payment_method_id: Option<String>,
}

/// A card payment SDK. Implementations are picked once when the app is composed.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Confirms the intent behind `client_secret` with the given card.
    ///
    /// `Err` is reserved for failures to talk to the provider at all; card
    /// problems come back as [`ConfirmOutcome::Error`].
    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        card: &CardDetails,
    ) -> AppResult<ConfirmOutcome>;
}

/// Intent ids are the prefix of the client secret (`pi_123_secret_abc`).
pub fn intent_id_from_secret(client_secret: &str) -> Option<&str> {
    client_secret
        .split_once("_secret_")
        .map(|(id, _)| id)
        .filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_intent_id_from_secret() {
        assert_eq!(intent_id_from_secret("pi_123_secret_abc"), Some("pi_123"));
        assert_eq!(intent_id_from_secret("garbage"), None);
        assert_eq!(intent_id_from_secret("_secret_abc"), None);
    }
}
