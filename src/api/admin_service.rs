use crate::{
    api::ApiClient,
    dto::documents::{AdminDocumentQuery, DocumentList, ReviewDecision, ReviewDocumentRequest},
    error::{AppError, AppResult},
    models::{Document, DocumentStatus, DocumentSummary},
};

#[derive(Clone)]
pub struct AdminService {
    client: ApiClient,
}

impl AdminService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list_documents(
        &self,
        status: Option<DocumentStatus>,
    ) -> AppResult<Vec<DocumentSummary>> {
        let query = AdminDocumentQuery { status };
        let list: DocumentList = self
            .client
            .get_with_query(&["admin", "documents"], &query, "document")
            .await?;
        Ok(list.items)
    }

    pub async fn approve_document(&self, property_id: &str, document_id: &str) -> AppResult<Document> {
        let body = ReviewDocumentRequest {
            decision: ReviewDecision::Approve,
            rejection_reason: None,
        };
        self.review(property_id, document_id, &body).await
    }

    pub async fn reject_document(
        &self,
        property_id: &str,
        document_id: &str,
        reason: &str,
    ) -> AppResult<Document> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::Validation(
                "A rejection reason is required".to_string(),
            ));
        }
        let body = ReviewDocumentRequest {
            decision: ReviewDecision::Reject,
            rejection_reason: Some(reason.to_string()),
        };
        self.review(property_id, document_id, &body).await
    }

    async fn review(
        &self,
        property_id: &str,
        document_id: &str,
        body: &ReviewDocumentRequest,
    ) -> AppResult<Document> {
        self.client
            .post(
                &["admin", "properties", property_id, "documents", document_id, "review"],
                body,
                "document",
            )
            .await
    }
}
