use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::{DocumentStatus, DocumentSummary, PropertySummary};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct AddFeedbackRequest {
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ReviewDocumentRequest {
    pub decision: ReviewDecision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema, IntoParams)]
pub struct AdminDocumentQuery {
    pub status: Option<DocumentStatus>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentList {
    pub items: Vec<DocumentSummary>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PropertyList {
    pub items: Vec<PropertySummary>,
}
