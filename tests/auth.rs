use std::sync::Arc;

use rental_checkout::{
    api::{AuthService, BookingService},
    error::{AppError, ErrorKind},
    session::{Anonymous, Credential, SharedSession},
    store::{DEMO_BOOKING_ID, TENANT_EMAIL, TENANT_PASSWORD},
};

mod common;
use common::spawn_app;

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = spawn_app().await;
    let session = SharedSession::new();
    let auth = AuthService::new(app.client(Arc::new(session.clone())), session);

    let err = auth.login(TENANT_EMAIL, "nope").await.unwrap_err();
    match err {
        AppError::Rejected { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid email or password");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert!(!auth.is_authenticated());
}

#[tokio::test]
async fn login_then_logout() {
    let app = spawn_app().await;
    let session = SharedSession::new();
    let auth = AuthService::new(app.client(Arc::new(session.clone())), session.clone());

    let resp = auth.login(TENANT_EMAIL, TENANT_PASSWORD).await.expect("login");
    assert_eq!(resp.role, "tenant");
    assert!(auth.is_authenticated());

    auth.logout();
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn anonymous_calls_fail_before_the_network() {
    let app = spawn_app().await;
    let bookings = BookingService::new(app.client(Arc::new(Anonymous)));

    let err = bookings.get_booking_by_id(DEMO_BOOKING_ID).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AuthRequired);
}

#[tokio::test]
async fn rejected_token_maps_to_auth_required() {
    let app = spawn_app().await;
    let session = SharedSession::with_credential(Credential::new("not-a-jwt", None));
    let bookings = BookingService::new(app.client(Arc::new(session)));

    let err = bookings.get_booking_by_id(DEMO_BOOKING_ID).await.unwrap_err();
    assert!(matches!(err, AppError::AuthRequired));
}

#[tokio::test]
async fn bookings_of_other_tenants_are_hidden() {
    let app = spawn_app().await;
    let (_session, client) = app.login("landlord@example.com", "landlord123").await;

    let err = BookingService::new(client)
        .get_booking_by_id(DEMO_BOOKING_ID)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
