use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::{
    dto::payments::CreatePaymentIntentRequest,
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Booking, PaymentIntent},
    response::{ApiResponse, Meta},
    state::AppState,
    store::Operation,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(get_booking))
        .route("/{id}/payment-intent", post(create_payment_intent))
}

#[utoipa::path(
    get,
    path = "/api/bookings/{id}",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking", body = ApiResponse<Booking>),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Booking not found")
    ),
    tag = "Bookings"
)]
pub async fn get_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let mut store = state.store.write().await;
    store.check_fault(Operation::GetBooking)?;
    let booking = store.get_booking(user.user_id, user.role, &id)?;
    Ok(Json(ApiResponse::success("OK", booking, Some(Meta::empty()))))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/payment-intent",
    params(("id" = String, Path, description = "Booking id")),
    request_body = CreatePaymentIntentRequest,
    responses(
        (status = 200, description = "Payment intent created", body = ApiResponse<PaymentIntent>),
        (status = 400, description = "Booking cannot be charged"),
        (status = 404, description = "Booking not found")
    ),
    tag = "Bookings"
)]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<CreatePaymentIntentRequest>,
) -> AppResult<Json<ApiResponse<PaymentIntent>>> {
    let mut store = state.store.write().await;
    store.check_fault(Operation::CreatePaymentIntent)?;
    let intent =
        store.create_payment_intent(user.user_id, user.role, &id, payload.setup_future_usage)?;
    Ok(Json(ApiResponse::success(
        "Payment intent created",
        intent,
        Some(Meta::empty()),
    )))
}
