use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use chrono::Utc;

use crate::{
    dto::documents::{AdminDocumentQuery, DocumentList, ReviewDocumentRequest},
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    models::Document,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/documents", get(list_documents))
        .route(
            "/properties/{property_id}/documents/{document_id}/review",
            post(review_document),
        )
}

#[utoipa::path(
    get,
    path = "/api/admin/documents",
    params(AdminDocumentQuery),
    responses(
        (status = 200, description = "Documents awaiting or past review", body = ApiResponse<DocumentList>),
        (status = 403, description = "Admin only")
    ),
    tag = "Admin"
)]
pub async fn list_documents(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AdminDocumentQuery>,
) -> AppResult<Json<ApiResponse<DocumentList>>> {
    ensure_admin(&user)?;
    let items = state
        .store
        .read()
        .await
        .document_summaries(|d| query.status.is_none_or(|s| d.status == s));
    let total = items.len() as i64;
    Ok(Json(ApiResponse::success(
        "Ok",
        DocumentList { items },
        Some(Meta::new(1, total, total)),
    )))
}

#[utoipa::path(
    post,
    path = "/api/admin/properties/{property_id}/documents/{document_id}/review",
    params(
        ("property_id" = String, Path, description = "Property id"),
        ("document_id" = String, Path, description = "Document id")
    ),
    request_body = ReviewDocumentRequest,
    responses(
        (status = 200, description = "Review recorded", body = ApiResponse<Document>),
        (status = 422, description = "Rejection without a reason")
    ),
    tag = "Admin"
)]
pub async fn review_document(
    State(state): State<AppState>,
    user: AuthUser,
    Path((property_id, document_id)): Path<(String, String)>,
    Json(payload): Json<ReviewDocumentRequest>,
) -> AppResult<Json<ApiResponse<Document>>> {
    ensure_admin(&user)?;
    let document = state.store.write().await.review_document(
        user.user_id,
        &property_id,
        &document_id,
        payload.decision,
        payload.rejection_reason.as_deref(),
        Utc::now(),
    )?;
    Ok(Json(ApiResponse::success(
        "Review recorded",
        document,
        Some(Meta::empty()),
    )))
}
