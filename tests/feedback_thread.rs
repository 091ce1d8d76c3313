use std::time::Duration;

use axum::http::StatusCode;
use rental_checkout::{
    api::{ApiClient, DocumentService, PropertyService},
    error::AppError,
    feedback::FeedbackController,
    models::SenderType,
    store::{
        DEMO_DOCUMENT_ID, DEMO_PROPERTY_ID, LANDLORD_EMAIL, LANDLORD_PASSWORD, Operation, Role,
    },
};

mod common;
use common::{TestApp, spawn_app};

fn landlord_view(client: &ApiClient, document_id: &str) -> FeedbackController {
    FeedbackController::new(
        DocumentService::new(client.clone()),
        PropertyService::new(client.clone()),
        SenderType::Landlord,
        document_id,
    )
}

async fn landlord(app: &TestApp) -> FeedbackController {
    let (_session, client) = app.login(LANDLORD_EMAIL, LANDLORD_PASSWORD).await;
    landlord_view(&client, DEMO_DOCUMENT_ID)
}

async fn mark_calls(app: &TestApp) -> u32 {
    app.state.store.read().await.counters.mark_feedback_read
}

#[tokio::test]
async fn load_resolves_property_and_orders_thread() {
    let app = spawn_app().await;
    let view = landlord(&app).await;

    let messages = view.load().await.expect("load");
    let ids: Vec<_> = messages.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ["F1", "F2"]);
    assert_eq!(view.unread_count(), 1);

    let document = view.document().expect("document");
    assert_eq!(document.property.id, DEMO_PROPERTY_ID);
    assert_eq!(document.feedback_thread.len(), 2);
}

#[tokio::test]
async fn sent_message_is_not_duplicated_by_refresh() {
    let app = spawn_app().await;
    let view = landlord(&app).await;
    view.load().await.expect("load");

    let sent = view.send("  Here is the full scan.  ").await.expect("send");
    assert!(sent.id.starts_with("fb_"));
    assert_eq!(sent.message, "Here is the full scan.");
    assert_eq!(sent.sender_type, SenderType::Landlord);

    let messages = view.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages.last().map(|m| m.id.clone()), Some(sent.id.clone()));

    let refreshed = view.refresh().await.expect("refresh");
    assert_eq!(refreshed.len(), 3);
    assert_eq!(refreshed.iter().filter(|m| m.id == sent.id).count(), 1);
    assert!(refreshed.iter().all(|m| !m.id.starts_with("temp-")));
}

#[tokio::test]
async fn blank_message_is_rejected_without_a_request() {
    let app = spawn_app().await;
    let view = landlord(&app).await;
    view.load().await.expect("load");

    let err = view.send(" \n\t ").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(view.messages().len(), 2);
    assert_eq!(app.state.store.read().await.counters.add_feedback, 0);
}

#[tokio::test]
async fn failed_send_rolls_back_the_optimistic_entry() {
    let app = spawn_app().await;
    let view = landlord(&app).await;
    view.load().await.expect("load");

    app.state
        .inject_fault(Operation::AddFeedback, StatusCode::INTERNAL_SERVER_ERROR)
        .await;
    let err = view.send("Will this arrive?").await.unwrap_err();
    assert!(matches!(err, AppError::Upstream { status: 500 }));

    let messages = view.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| m.message != "Will this arrive?"));
}

#[tokio::test]
async fn mark_read_only_when_visible_and_unread() {
    let app = spawn_app().await;
    let view = landlord(&app).await;
    view.load().await.expect("load");

    assert!(!view.mark_read().await.expect("hidden"));
    assert_eq!(mark_calls(&app).await, 0);

    view.set_visible(true);
    assert!(view.mark_read().await.expect("visible"));
    assert_eq!(mark_calls(&app).await, 1);
    assert_eq!(view.unread_count(), 0);
    let document = view.document().expect("document");
    assert!(document.feedback_read);
    assert!(document.feedback_thread.iter().find(|m| m.id == "F1").is_some_and(|m| m.is_read));

    assert!(!view.mark_read().await.expect("nothing unread"));
    assert_eq!(mark_calls(&app).await, 1);

    // A stale refresh cannot flip the read flag back.
    view.refresh().await.expect("refresh");
    assert!(view.document().expect("document").feedback_read);
    assert_eq!(view.unread_count(), 0);
}

#[tokio::test]
async fn unknown_document_is_not_found() {
    let app = spawn_app().await;
    let (_session, client) = app.login(LANDLORD_EMAIL, LANDLORD_PASSWORD).await;
    let view = landlord_view(&client, "D404");

    assert!(matches!(view.load().await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn other_landlords_cannot_read_the_thread() {
    let app = spawn_app().await;
    app.state
        .store
        .write()
        .await
        .add_user("other@example.com", "other123", Role::Landlord)
        .expect("add user");
    let (_session, client) = app.login("other@example.com", "other123").await;
    let view = landlord_view(&client, DEMO_DOCUMENT_ID).with_property(DEMO_PROPERTY_ID);

    assert!(matches!(view.load().await, Err(AppError::Forbidden(_))));
    assert!(view.messages().is_empty());
}

#[tokio::test]
async fn send_before_load_shows_the_message_immediately() {
    let app = spawn_app().await;
    let view = landlord(&app).await;

    // Hold the backend so property resolution cannot finish yet.
    let store = app.state.store.write().await;
    let sending = tokio::spawn({
        let view = view.clone();
        async move { view.send("Uploaded the full page.").await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let pending = view.messages();
    assert_eq!(pending.len(), 1);
    assert!(pending[0].id.starts_with("temp-"));
    assert!(pending[0].is_read);
    drop(store);

    let sent = sending.await.expect("join").expect("send");
    let ids: Vec<_> = view.messages().into_iter().map(|m| m.id).collect();
    assert_eq!(ids, [sent.id]);
}

#[tokio::test]
async fn unresolvable_document_rolls_back_the_send() {
    let app = spawn_app().await;
    let (_session, client) = app.login(LANDLORD_EMAIL, LANDLORD_PASSWORD).await;
    let view = landlord_view(&client, "D404");

    let err = view.send("Anyone there?").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(view.messages().is_empty());
    assert_eq!(app.state.store.read().await.counters.add_feedback, 0);
}
