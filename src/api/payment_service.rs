use crate::{
    api::ApiClient,
    dto::payments::{CreatePaymentIntentRequest, ProcessPaymentRequest},
    error::AppResult,
    models::PaymentIntent,
    response::Ack,
};

#[derive(Clone)]
pub struct PaymentService {
    client: ApiClient,
}

impl PaymentService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_payment_intent(
        &self,
        booking_id: &str,
        request: &CreatePaymentIntentRequest,
    ) -> AppResult<PaymentIntent> {
        self.client
            .post(&["bookings", booking_id, "payment-intent"], request, "booking")
            .await
    }

    /// Tells the backend the provider confirmed the charge so it can mark the booking paid.
    #[tracing::instrument(skip(self, payment_method_id))]
    pub async fn process_payment(
        &self,
        intent_id: &str,
        payment_method_id: &str,
        save_card: bool,
    ) -> AppResult<Ack> {
        let body = ProcessPaymentRequest {
            payment_method_id: payment_method_id.to_string(),
            save_card,
        };
        self.client
            .post(&["payments", intent_id, "process"], &body, "payment")
            .await
    }
}
