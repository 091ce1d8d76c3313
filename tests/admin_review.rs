use rental_checkout::{
    api::{AdminService, DocumentService, PropertyService},
    error::AppError,
    feedback::FeedbackController,
    models::{DocumentStatus, SenderType},
    store::{
        ADMIN_EMAIL, ADMIN_PASSWORD, APPROVED_DOCUMENT_ID, DEMO_DOCUMENT_ID, DEMO_PROPERTY_ID,
        LANDLORD_EMAIL, LANDLORD_PASSWORD,
    },
};

mod common;
use common::spawn_app;

#[tokio::test]
async fn pending_queue_lists_demo_document() {
    let app = spawn_app().await;
    let (_session, client) = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let admin = AdminService::new(client);

    let pending = admin
        .list_documents(Some(DocumentStatus::Pending))
        .await
        .expect("list");
    assert!(pending.iter().any(|d| d.id == DEMO_DOCUMENT_ID));
    assert!(pending.iter().all(|d| d.id != APPROVED_DOCUMENT_ID));

    let all = admin.list_documents(None).await.expect("list all");
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn reject_requires_a_reason() {
    let app = spawn_app().await;
    let (_session, client) = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let admin = AdminService::new(client);

    let err = admin
        .reject_document(DEMO_PROPERTY_ID, DEMO_DOCUMENT_ID, "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let store = app.state.store.read().await;
    assert_eq!(
        store.document(DEMO_DOCUMENT_ID).map(|d| d.status),
        Some(DocumentStatus::Pending)
    );
}

#[tokio::test]
async fn rejection_reaches_the_landlord_thread() {
    let app = spawn_app().await;
    let (_session, client) = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let document = AdminService::new(client)
        .reject_document(DEMO_PROPERTY_ID, DEMO_DOCUMENT_ID, "Scan is unreadable")
        .await
        .expect("reject");
    assert_eq!(document.status, DocumentStatus::Rejected);
    assert_eq!(document.rejection_reason.as_deref(), Some("Scan is unreadable"));

    let (_session, client) = app.login(LANDLORD_EMAIL, LANDLORD_PASSWORD).await;
    let view = FeedbackController::new(
        DocumentService::new(client.clone()),
        PropertyService::new(client),
        SenderType::Landlord,
        DEMO_DOCUMENT_ID,
    );
    let messages = view.load().await.expect("load");
    assert_eq!(messages.len(), 3);
    let last = messages.last().expect("rejection message");
    assert_eq!(last.sender_type, SenderType::Admin);
    assert_eq!(last.message, "Document rejected: Scan is unreadable");
    assert_eq!(view.unread_count(), 2);
}

#[tokio::test]
async fn landlords_cannot_review() {
    let app = spawn_app().await;
    let (_session, client) = app.login(LANDLORD_EMAIL, LANDLORD_PASSWORD).await;

    let err = AdminService::new(client)
        .approve_document(DEMO_PROPERTY_ID, DEMO_DOCUMENT_ID)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}
