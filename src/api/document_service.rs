use crate::{
    api::ApiClient,
    dto::documents::{AddFeedbackRequest, DocumentList},
    error::AppResult,
    models::{Document, DocumentSummary, FeedbackMessage},
    response::Ack,
};

#[derive(Clone)]
pub struct DocumentService {
    client: ApiClient,
}

impl DocumentService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list_property_documents(
        &self,
        property_id: &str,
    ) -> AppResult<Vec<DocumentSummary>> {
        let list: DocumentList = self
            .client
            .get(&["properties", property_id, "documents"], "property")
            .await?;
        Ok(list.items)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_document_details(
        &self,
        property_id: &str,
        document_id: &str,
    ) -> AppResult<Document> {
        self.client
            .get(
                &["properties", property_id, "documents", document_id],
                "document",
            )
            .await
    }

    #[tracing::instrument(skip(self, message))]
    pub async fn add_feedback_message(
        &self,
        property_id: &str,
        document_id: &str,
        message: &str,
    ) -> AppResult<FeedbackMessage> {
        let body = AddFeedbackRequest {
            message: message.to_string(),
        };
        self.client
            .post(
                &["properties", property_id, "documents", document_id, "feedback"],
                &body,
                "document",
            )
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn mark_feedback_read(&self, property_id: &str, document_id: &str) -> AppResult<Ack> {
        self.client
            .post(
                &[
                    "properties",
                    property_id,
                    "documents",
                    document_id,
                    "feedback",
                    "read",
                ],
                &serde_json::json!({}),
                "document",
            )
            .await
    }
}
