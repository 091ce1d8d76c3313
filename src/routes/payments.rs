use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};

use crate::{
    dto::payments::ProcessPaymentRequest,
    error::AppResult,
    middleware::auth::AuthUser,
    response::{Ack, ApiResponse, Meta},
    state::AppState,
    store::Operation,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{intent_id}/process", post(process_payment))
}

#[utoipa::path(
    post,
    path = "/api/payments/{intent_id}/process",
    params(("intent_id" = String, Path, description = "Payment intent id")),
    request_body = ProcessPaymentRequest,
    responses(
        (status = 200, description = "Payment recorded", body = ApiResponse<Ack>),
        (status = 404, description = "Unknown payment intent")
    ),
    tag = "Payments"
)]
pub async fn process_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(intent_id): Path<String>,
    Json(payload): Json<ProcessPaymentRequest>,
) -> AppResult<Json<ApiResponse<Ack>>> {
    let mut store = state.store.write().await;
    store.check_fault(Operation::ProcessPayment)?;
    store.process_payment(
        user.user_id,
        user.role,
        &intent_id,
        &payload.payment_method_id,
    )?;
    if payload.save_card {
        tracing::debug!(intent_id, "card saved for future use");
    }
    Ok(Json(ApiResponse::success(
        "Payment recorded",
        Ack::ok(),
        Some(Meta::empty()),
    )))
}
