use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Default, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreatePaymentIntentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_future_usage: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ProcessPaymentRequest {
    pub payment_method_id: String,
    pub save_card: bool,
}
