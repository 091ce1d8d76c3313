#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use rental_checkout::{
    api::{ApiClient, AuthService},
    routes::create_app,
    session::{SessionProvider, SharedSession},
    state::AppState,
    store::Store,
};

pub const JWT_SECRET: &str = "sandbox-test-secret";

pub struct TestApp {
    pub base_url: String,
    pub state: AppState,
}

/// Serves a freshly seeded sandbox on an ephemeral port.
pub async fn spawn_app() -> TestApp {
    let store = Store::seeded().expect("seed store");
    let state = AppState::new(store, JWT_SECRET);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let app = create_app(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve sandbox");
    });
    TestApp {
        base_url: format!("http://{addr}/api"),
        state,
    }
}

impl TestApp {
    pub fn client(&self, session: Arc<dyn SessionProvider>) -> ApiClient {
        ApiClient::new(&self.base_url, session, Duration::from_secs(5)).expect("api client")
    }

    /// Signs in and returns the filled session with a client bound to it.
    pub async fn login(&self, email: &str, password: &str) -> (SharedSession, ApiClient) {
        let session = SharedSession::new();
        let client = self.client(Arc::new(session.clone()));
        AuthService::new(client.clone(), session.clone())
            .login(email, password)
            .await
            .expect("login");
        (session, client)
    }
}
