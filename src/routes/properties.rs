use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use chrono::Utc;

use crate::{
    dto::documents::{AddFeedbackRequest, DocumentList, PropertyList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Document, FeedbackMessage, PropertySummary},
    response::{Ack, ApiResponse, Meta},
    state::AppState,
    store::Operation,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/mine", get(list_my_properties))
        .route("/{property_id}", get(get_property))
        .route("/{property_id}/documents", get(list_documents))
        .route("/{property_id}/documents/{document_id}", get(get_document))
        .route(
            "/{property_id}/documents/{document_id}/feedback",
            post(add_feedback),
        )
        .route(
            "/{property_id}/documents/{document_id}/feedback/read",
            post(mark_feedback_read),
        )
}

#[utoipa::path(
    get,
    path = "/api/properties/mine",
    responses((status = 200, description = "Properties owned by the caller", body = ApiResponse<PropertyList>)),
    tag = "Properties"
)]
pub async fn list_my_properties(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<PropertyList>>> {
    let items = state.store.read().await.properties_of(user.user_id);
    let total = items.len() as i64;
    Ok(Json(ApiResponse::success(
        "Ok",
        PropertyList { items },
        Some(Meta::new(1, total, total)),
    )))
}

#[utoipa::path(
    get,
    path = "/api/properties/{property_id}",
    params(("property_id" = String, Path, description = "Property id")),
    responses(
        (status = 200, description = "Property", body = ApiResponse<PropertySummary>),
        (status = 404, description = "Property not found")
    ),
    tag = "Properties"
)]
pub async fn get_property(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(property_id): Path<String>,
) -> AppResult<Json<ApiResponse<PropertySummary>>> {
    let property = state.store.read().await.property(&property_id)?;
    Ok(Json(ApiResponse::success("OK", property, Some(Meta::empty()))))
}

#[utoipa::path(
    get,
    path = "/api/properties/{property_id}/documents",
    params(("property_id" = String, Path, description = "Property id")),
    responses(
        (status = 200, description = "Verification documents", body = ApiResponse<DocumentList>),
        (status = 403, description = "Not the owner")
    ),
    tag = "Documents"
)]
pub async fn list_documents(
    State(state): State<AppState>,
    user: AuthUser,
    Path(property_id): Path<String>,
) -> AppResult<Json<ApiResponse<DocumentList>>> {
    let items = state
        .store
        .read()
        .await
        .property_documents(user.user_id, user.role, &property_id)?;
    let total = items.len() as i64;
    Ok(Json(ApiResponse::success(
        "Ok",
        DocumentList { items },
        Some(Meta::new(1, total, total)),
    )))
}

#[utoipa::path(
    get,
    path = "/api/properties/{property_id}/documents/{document_id}",
    params(
        ("property_id" = String, Path, description = "Property id"),
        ("document_id" = String, Path, description = "Document id")
    ),
    responses(
        (status = 200, description = "Document with feedback thread", body = ApiResponse<Document>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Document not found")
    ),
    tag = "Documents"
)]
pub async fn get_document(
    State(state): State<AppState>,
    user: AuthUser,
    Path((property_id, document_id)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<Document>>> {
    let mut store = state.store.write().await;
    store.check_fault(Operation::GetDocument)?;
    let document = store.get_document(user.user_id, user.role, &property_id, &document_id)?;
    Ok(Json(ApiResponse::success("OK", document, Some(Meta::empty()))))
}

#[utoipa::path(
    post,
    path = "/api/properties/{property_id}/documents/{document_id}/feedback",
    params(
        ("property_id" = String, Path, description = "Property id"),
        ("document_id" = String, Path, description = "Document id")
    ),
    request_body = AddFeedbackRequest,
    responses(
        (status = 200, description = "Message stored", body = ApiResponse<FeedbackMessage>),
        (status = 422, description = "Empty message")
    ),
    tag = "Documents"
)]
pub async fn add_feedback(
    State(state): State<AppState>,
    user: AuthUser,
    Path((property_id, document_id)): Path<(String, String)>,
    Json(payload): Json<AddFeedbackRequest>,
) -> AppResult<Json<ApiResponse<FeedbackMessage>>> {
    let mut store = state.store.write().await;
    store.check_fault(Operation::AddFeedback)?;
    let message = store.add_feedback(
        user.user_id,
        user.role,
        &property_id,
        &document_id,
        &payload.message,
        Utc::now(),
    )?;
    Ok(Json(ApiResponse::success(
        "Feedback added",
        message,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    post,
    path = "/api/properties/{property_id}/documents/{document_id}/feedback/read",
    params(
        ("property_id" = String, Path, description = "Property id"),
        ("document_id" = String, Path, description = "Document id")
    ),
    responses((status = 200, description = "Thread marked read", body = ApiResponse<Ack>)),
    tag = "Documents"
)]
pub async fn mark_feedback_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path((property_id, document_id)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<Ack>>> {
    let mut store = state.store.write().await;
    store.check_fault(Operation::MarkFeedbackRead)?;
    store.mark_feedback_read(user.user_id, user.role, &property_id, &document_id)?;
    Ok(Json(ApiResponse::success("Ok", Ack::ok(), Some(Meta::empty()))))
}
