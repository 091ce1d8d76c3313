use crate::{
    api::ApiClient,
    dto::auth::{LoginRequest, LoginResponse},
    error::AppResult,
    session::{Credential, SharedSession},
};

#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
    session: SharedSession,
}

impl AuthService {
    /// `session` must be the same slot the other clients were built with.
    pub fn new(client: ApiClient, session: SharedSession) -> Self {
        Self { client, session }
    }

    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> AppResult<LoginResponse> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp: LoginResponse = self
            .client
            .post_public(&["auth", "login"], &body, "account")
            .await?;
        self.session
            .set(Credential::new(resp.token.clone(), Some(resp.expires_at)));
        tracing::info!(role = %resp.role, "signed in");
        Ok(resp)
    }

    pub fn logout(&self) {
        self.session.clear();
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }
}
