use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use crate::{
    api::{DocumentService, PropertyService},
    error::{AppError, AppResult},
    feedback::FeedbackThread,
    models::{Document, FeedbackMessage, SenderType},
};

#[derive(Default)]
struct ThreadState {
    property_id: Option<String>,
    document: Option<Document>,
    thread: FeedbackThread,
    visible: bool,
    marking_read: bool,
}

/// Owns the feedback thread of one open document view.
#[derive(Clone)]
pub struct FeedbackController {
    documents: DocumentService,
    properties: PropertyService,
    viewer: SenderType,
    document_id: String,
    state: Arc<Mutex<ThreadState>>,
}

impl FeedbackController {
    /// `viewer` is who is reading; everyone else is the counter-party.
    pub fn new(
        documents: DocumentService,
        properties: PropertyService,
        viewer: SenderType,
        document_id: impl Into<String>,
    ) -> Self {
        Self {
            documents,
            properties,
            viewer,
            document_id: document_id.into(),
            state: Arc::new(Mutex::new(ThreadState::default())),
        }
    }

    /// Skips property lookup when the caller already knows the owner (admin review pages).
    pub fn with_property(self, property_id: impl Into<String>) -> Self {
        self.lock().property_id = Some(property_id.into());
        self
    }

    fn lock(&self) -> MutexGuard<'_, ThreadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn messages(&self) -> Vec<FeedbackMessage> {
        self.lock().thread.to_vec()
    }

    /// The loaded document with the current thread in place.
    pub fn document(&self) -> Option<Document> {
        let state = self.lock();
        state.document.clone().map(|mut doc| {
            doc.feedback_thread = state.thread.to_vec();
            doc
        })
    }

    pub fn unread_count(&self) -> usize {
        self.lock().thread.unread_count(self.viewer)
    }

    pub fn set_visible(&self, visible: bool) {
        self.lock().visible = visible;
    }

    async fn resolve_property(&self) -> AppResult<String> {
        if let Some(id) = self.lock().property_id.clone() {
            return Ok(id);
        }

        for property in self.properties.list_my_properties().await? {
            let documents = self.documents.list_property_documents(&property.id).await?;
            if documents.iter().any(|d| d.id == self.document_id) {
                tracing::debug!(document_id = %self.document_id, property_id = %property.id, "resolved document owner");
                self.lock().property_id = Some(property.id.clone());
                return Ok(property.id);
            }
        }
        Err(AppError::NotFound("document".to_string()))
    }

    /// Fetches the document and merges its thread, oldest first.
    pub async fn load(&self) -> AppResult<Vec<FeedbackMessage>> {
        let property_id = self.resolve_property().await?;
        let mut document = self
            .documents
            .get_document_details(&property_id, &self.document_id)
            .await?;

        let server_thread = std::mem::take(&mut document.feedback_thread);
        let mut state = self.lock();
        if state.document.as_ref().is_some_and(|d| d.feedback_read) {
            document.feedback_read = true;
        }
        state.document = Some(document);
        state.thread.merge_server(server_thread);
        Ok(state.thread.to_vec())
    }

    /// Re-fetches the thread; confirmed sends are not duplicated.
    pub async fn refresh(&self) -> AppResult<Vec<FeedbackMessage>> {
        self.load().await
    }

    /// Sends `text`, showing it in the thread before the backend answers.
    pub async fn send(&self, text: &str) -> AppResult<FeedbackMessage> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("Message cannot be empty".to_string()));
        }
        let temp_id = self
            .lock()
            .thread
            .append_optimistic(text, self.viewer, Utc::now());

        let result = match self.resolve_property().await {
            Ok(property_id) => {
                self.documents
                    .add_feedback_message(&property_id, &self.document_id, text)
                    .await
            }
            Err(err) => Err(err),
        };

        let mut state = self.lock();
        match result {
            Ok(message) => {
                state.thread.confirm(&temp_id, message.clone());
                Ok(message)
            }
            Err(err) => {
                state.thread.remove(&temp_id);
                tracing::warn!(document_id = %self.document_id, error = %err, "feedback send failed");
                Err(err)
            }
        }
    }

    /// Marks counter-party messages read while the thread is on screen.
    ///
    /// Returns `Ok(false)` without any request when the thread is hidden, has
    /// nothing unread, or a mark is already in flight.
    pub async fn mark_read(&self) -> AppResult<bool> {
        let property_id = {
            let mut state = self.lock();
            if !state.visible || state.marking_read || !state.thread.has_unread_from(self.viewer) {
                return Ok(false);
            }
            let Some(property_id) = state.property_id.clone() else {
                return Ok(false);
            };
            state.marking_read = true;
            property_id
        };

        let result = self
            .documents
            .mark_feedback_read(&property_id, &self.document_id)
            .await;

        let mut state = self.lock();
        state.marking_read = false;
        result?;
        let changed = state.thread.mark_counterparty_read(self.viewer);
        if let Some(doc) = state.document.as_mut() {
            doc.feedback_read = true;
        }
        tracing::debug!(document_id = %self.document_id, changed, "feedback marked read");
        Ok(true)
    }
}
