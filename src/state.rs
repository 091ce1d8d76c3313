use std::sync::Arc;

use axum::http::StatusCode;
use tokio::sync::RwLock;

use crate::store::{Operation, Store};

/// Shared state of the sandbox backend.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<Store>>,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new(store: Store, jwt_secret: impl Into<Arc<str>>) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            jwt_secret: jwt_secret.into(),
        }
    }

    /// Makes the next call to `operation` fail with `status`.
    pub async fn inject_fault(&self, operation: Operation, status: StatusCode) {
        self.store.write().await.inject_fault(operation, status);
    }
}
