//! Typed clients for the marketplace REST backend.
//!
//! Every service shares one [`ApiClient`], which owns the HTTP transport,
//! attaches the bearer credential from the injected session, unwraps the
//! `ApiResponse` envelope and turns non-success statuses into [`AppError`].

use std::{sync::Arc, time::Duration};

use anyhow::anyhow;
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    config::AppConfig,
    error::{AppError, AppResult, ErrorData},
    response::ApiResponse,
    session::SessionProvider,
};

pub mod admin_service;
pub mod auth_service;
pub mod booking_service;
pub mod document_service;
pub mod payment_service;
pub mod property_service;

pub use admin_service::AdminService;
pub use auth_service::AuthService;
pub use booking_service::BookingService;
pub use document_service::DocumentService;
pub use payment_service::PaymentService;
pub use property_service::PropertyService;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: Arc<dyn SessionProvider>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        session: Arc<dyn SessionProvider>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::Internal(anyhow!("invalid API base url {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Internal(anyhow!(
                "API base url {base_url} cannot carry a path"
            )));
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("rental-checkout/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    pub fn from_config(config: &AppConfig, session: Arc<dyn SessionProvider>) -> AppResult<Self> {
        Self::new(&config.api_base_url, session, config.http_timeout)
    }

    /// Joins path segments onto the base url, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        resource: &str,
    ) -> AppResult<T> {
        let request = self.http.request(Method::GET, self.url(segments));
        self.send(request, resource, true).await
    }

    pub(crate) async fn get_with_query<Q: Serialize, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &Q,
        resource: &str,
    ) -> AppResult<T> {
        let request = self.http.request(Method::GET, self.url(segments)).query(query);
        self.send(request, resource, true).await
    }

    pub(crate) async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
        resource: &str,
    ) -> AppResult<T> {
        let request = self.http.request(Method::POST, self.url(segments)).json(body);
        self.send(request, resource, true).await
    }

    /// POST without a bearer credential (login).
    pub(crate) async fn post_public<B: Serialize, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
        resource: &str,
    ) -> AppResult<T> {
        let request = self.http.request(Method::POST, self.url(segments)).json(body);
        self.send(request, resource, false).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &str,
        authenticated: bool,
    ) -> AppResult<T> {
        let request = if authenticated {
            let Some(credential) = self.session.current() else {
                tracing::debug!(resource, "no valid session, refusing request");
                return Err(AppError::AuthRequired);
            };
            request.bearer_auth(credential.token)
        } else {
            request
        };

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(error_from_status(status, &body, resource));
        }

        let envelope: ApiResponse<T> = serde_json::from_slice(&body)?;
        envelope
            .data
            .ok_or_else(|| AppError::Internal(anyhow!("{resource} response carried no data")))
    }
}

fn transport_error(err: reqwest::Error) -> AppError {
    tracing::warn!(error = %err, "request did not complete");
    let reason = if err.is_timeout() {
        "the server took too long to respond"
    } else if err.is_connect() {
        "could not reach the server"
    } else {
        "the connection was interrupted"
    };
    AppError::TransientNetwork(reason.to_string())
}

/// Maps a failed response onto the error taxonomy.
pub(crate) fn error_from_status(status: StatusCode, body: &[u8], resource: &str) -> AppError {
    let message = extract_message(body);
    match status {
        StatusCode::UNAUTHORIZED => AppError::AuthRequired,
        StatusCode::FORBIDDEN => AppError::Forbidden(resource.to_string()),
        StatusCode::NOT_FOUND => AppError::NotFound(resource.to_string()),
        StatusCode::PAYMENT_REQUIRED => AppError::PaymentDeclined(
            message.unwrap_or_else(|| "Your payment was declined.".to_string()),
        ),
        s if s.is_client_error() => AppError::Rejected {
            status: s.as_u16(),
            message: message.unwrap_or_else(|| {
                s.canonical_reason().unwrap_or("Request rejected").to_string()
            }),
        },
        s => {
            tracing::warn!(
                status = %s,
                resource,
                detail = message.as_deref().unwrap_or("-"),
                "backend failure"
            );
            AppError::Upstream { status: s.as_u16() }
        }
    }
}

fn extract_message(body: &[u8]) -> Option<String> {
    if let Ok(envelope) = serde_json::from_slice::<ApiResponse<ErrorData>>(body) {
        let text = envelope
            .data
            .map(|d| d.error)
            .filter(|e| !e.trim().is_empty())
            .unwrap_or(envelope.message);
        return Some(text).filter(|t| !t.trim().is_empty());
    }
    let text = String::from_utf8_lossy(body).trim().to_string();
    Some(text).filter(|t| !t.is_empty() && t.len() <= 500)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Anonymous;

    #[test]
    fn statuses_map_onto_taxonomy() {
        assert!(matches!(
            error_from_status(StatusCode::UNAUTHORIZED, b"", "booking"),
            AppError::AuthRequired
        ));
        assert!(matches!(
            error_from_status(StatusCode::NOT_FOUND, b"", "booking"),
            AppError::NotFound(r) if r == "booking"
        ));
        assert!(matches!(
            error_from_status(StatusCode::BAD_GATEWAY, b"oops", "booking"),
            AppError::Upstream { status: 502 }
        ));
    }

    #[test]
    fn client_errors_surface_backend_message_verbatim() {
        let body = br#"{"message":"Booking already paid","data":{"error":"Booking already paid"},"meta":null}"#;
        match error_from_status(StatusCode::BAD_REQUEST, body, "booking") {
            AppError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Booking already paid");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn url_segments_are_encoded() {
        let client = ApiClient::new(
            "http://localhost:3000/api/",
            Arc::new(Anonymous),
            Duration::from_secs(1),
        )
        .unwrap();
        let url = client.url(&["bookings", "a b/c"]);
        assert_eq!(url.as_str(), "http://localhost:3000/api/bookings/a%20b%2Fc");
    }
}
