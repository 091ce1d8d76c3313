//! In-memory data behind the sandbox backend.

use std::collections::HashMap;

use anyhow::anyhow;
use argon2::{
    Argon2, PasswordHasher, PasswordVerifier,
    password_hash::{PasswordHash, SaltString},
};
use axum::http::StatusCode;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    audit::AuditLog,
    dto::documents::ReviewDecision,
    error::{AppError, AppResult},
    models::{
        Booking, BookingStatus, Document, DocumentStatus, DocumentSummary, FeedbackMessage,
        PaymentIntent, PaymentIntentStatus, PropertyRef, PropertySummary, SenderType,
    },
};

pub const DEMO_BOOKING_ID: &str = "B1";
pub const PAID_BOOKING_ID: &str = "B2";
pub const CANCELLED_BOOKING_ID: &str = "B3";
pub const DEMO_PROPERTY_ID: &str = "P1";
pub const SECOND_PROPERTY_ID: &str = "P2";
pub const DEMO_DOCUMENT_ID: &str = "D1";
pub const APPROVED_DOCUMENT_ID: &str = "D2";

pub const LANDLORD_EMAIL: &str = "landlord@example.com";
pub const LANDLORD_PASSWORD: &str = "landlord123";
pub const TENANT_EMAIL: &str = "tenant@example.com";
pub const TENANT_PASSWORD: &str = "tenant123";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Landlord,
    Tenant,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Landlord => "landlord",
            Role::Tenant => "tenant",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "landlord" => Some(Role::Landlord),
            "tenant" => Some(Role::Tenant),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn sender_type(self) -> SenderType {
        match self {
            Role::Landlord => SenderType::Landlord,
            Role::Tenant => SenderType::Tenant,
            Role::Admin => SenderType::Admin,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
struct PropertyRecord {
    summary: PropertySummary,
    owner_id: Uuid,
}

#[derive(Debug, Clone)]
struct BookingRecord {
    booking: Booking,
    tenant_id: Uuid,
}

/// Backend operations that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetBooking,
    CreatePaymentIntent,
    ProcessPayment,
    GetDocument,
    AddFeedback,
    MarkFeedbackRead,
}

/// Per-operation call counts, for asserting how often clients hit the backend.
#[derive(Debug, Clone, Default)]
pub struct RequestCounters {
    pub intents_by_booking: HashMap<String, u32>,
    pub process_payment: u32,
    pub add_feedback: u32,
    pub mark_feedback_read: u32,
    pub get_document: u32,
}

#[derive(Default)]
pub struct Store {
    users: Vec<UserRecord>,
    properties: HashMap<String, PropertyRecord>,
    bookings: HashMap<String, BookingRecord>,
    intents: HashMap<String, PaymentIntent>,
    documents: HashMap<String, Document>,
    faults: HashMap<Operation, StatusCode>,
    pub counters: RequestCounters,
    pub audit: AuditLog,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Demo data: one landlord with two properties, one tenant with three bookings, one admin.
    pub fn seeded() -> anyhow::Result<Self> {
        let mut store = Self::new();
        let landlord = store.add_user(LANDLORD_EMAIL, LANDLORD_PASSWORD, Role::Landlord)?;
        let tenant = store.add_user(TENANT_EMAIL, TENANT_PASSWORD, Role::Tenant)?;
        store.add_user(ADMIN_EMAIL, ADMIN_PASSWORD, Role::Admin)?;

        let loft = PropertySummary {
            id: DEMO_PROPERTY_ID.into(),
            title: "Sunny Downtown Loft".into(),
            city: "Austin".into(),
            state: "TX".into(),
            price_per_night: 12_500,
        };
        let cabin = PropertySummary {
            id: SECOND_PROPERTY_ID.into(),
            title: "Lakeside Cabin".into(),
            city: "Denver".into(),
            state: "CO".into(),
            price_per_night: 20_000,
        };
        store.add_property(loft.clone(), landlord);
        store.add_property(cabin.clone(), landlord);

        let created = Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).single().ok_or_else(|| anyhow!("bad seed date"))?;
        let stay = |id: &str, property: &PropertySummary, from: (i32, u32, u32), nights: i64| -> anyhow::Result<Booking> {
            let check_in = NaiveDate::from_ymd_opt(from.0, from.1, from.2)
                .ok_or_else(|| anyhow!("bad seed date"))?;
            let subtotal = property.price_per_night * nights;
            let cleaning_fee = 5_000;
            let service_fee = subtotal / 15;
            Ok(Booking {
                id: id.into(),
                property: property.clone(),
                check_in_date: check_in,
                check_out_date: check_in + Duration::days(nights),
                guests: 2,
                subtotal,
                cleaning_fee,
                service_fee,
                total_price: subtotal + cleaning_fee + service_fee,
                status: BookingStatus::Pending,
                is_paid: false,
                created_at: created,
                guest_email: None,
                guest_name: None,
                guest_phone: None,
            })
        };

        // 3 nights at $125 + $50 cleaning + $25 service = $450
        let demo = stay(DEMO_BOOKING_ID, &loft, (2026, 11, 1), 3)?;
        store.add_booking(demo, tenant);

        let mut paid = stay(PAID_BOOKING_ID, &cabin, (2026, 12, 20), 2)?;
        paid.status = BookingStatus::Confirmed;
        paid.is_paid = true;
        store.add_booking(paid, tenant);

        let mut cancelled = stay(CANCELLED_BOOKING_ID, &loft, (2027, 1, 10), 4)?;
        cancelled.status = BookingStatus::Cancelled;
        store.add_booking(cancelled, tenant);

        store.documents.insert(
            DEMO_DOCUMENT_ID.into(),
            Document {
                id: DEMO_DOCUMENT_ID.into(),
                document_type: "ownership_deed".into(),
                status: DocumentStatus::Pending,
                rejection_reason: None,
                feedback_thread: vec![
                    FeedbackMessage {
                        id: "F1".into(),
                        message: "The scan is cut off at the bottom. Please upload the full page.".into(),
                        sender_type: SenderType::Admin,
                        created_at: created + Duration::hours(1),
                        is_read: false,
                    },
                    FeedbackMessage {
                        id: "F2".into(),
                        message: "Uploading a new scan shortly.".into(),
                        sender_type: SenderType::Landlord,
                        created_at: created + Duration::hours(2),
                        is_read: true,
                    },
                ],
                feedback_read: false,
                created_at: created,
                property: PropertyRef {
                    id: loft.id.clone(),
                    title: loft.title.clone(),
                },
            },
        );
        store.documents.insert(
            APPROVED_DOCUMENT_ID.into(),
            Document {
                id: APPROVED_DOCUMENT_ID.into(),
                document_type: "insurance_certificate".into(),
                status: DocumentStatus::Approved,
                rejection_reason: None,
                feedback_thread: Vec::new(),
                feedback_read: true,
                created_at: created,
                property: PropertyRef {
                    id: cabin.id.clone(),
                    title: cabin.title.clone(),
                },
            },
        );

        Ok(store)
    }

    pub fn add_user(&mut self, email: &str, password: &str, role: Role) -> anyhow::Result<Uuid> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!(e.to_string()))?
            .to_string();
        let id = Uuid::new_v4();
        self.users.push(UserRecord {
            id,
            email: email.to_string(),
            password_hash,
            role,
        });
        Ok(id)
    }

    pub fn add_property(&mut self, summary: PropertySummary, owner_id: Uuid) {
        self.properties
            .insert(summary.id.clone(), PropertyRecord { summary, owner_id });
    }

    pub fn add_booking(&mut self, booking: Booking, tenant_id: Uuid) {
        self.bookings
            .insert(booking.id.clone(), BookingRecord { booking, tenant_id });
    }

    pub fn user_by_email(&self, email: &str) -> Option<&UserRecord> {
        self.users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email.trim()))
    }

    pub fn verify_login(&self, email: &str, password: &str) -> AppResult<UserRecord> {
        let invalid = || AppError::Rejected {
            status: 400,
            message: "Invalid email or password".into(),
        };
        let user = self.user_by_email(email).ok_or_else(invalid)?;
        let parsed = PasswordHash::new(&user.password_hash)
            .map_err(|_| AppError::Internal(anyhow!("Invalid password hash")))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| invalid())?;
        Ok(user.clone())
    }

    pub fn inject_fault(&mut self, operation: Operation, status: StatusCode) {
        self.faults.insert(operation, status);
    }

    /// Fails once if a fault was injected for `operation`.
    pub fn check_fault(&mut self, operation: Operation) -> AppResult<()> {
        match self.faults.remove(&operation) {
            None => Ok(()),
            Some(status) => {
                tracing::info!(?operation, %status, "injected fault");
                Err(match status {
                    StatusCode::UNAUTHORIZED => AppError::AuthRequired,
                    StatusCode::NOT_FOUND => AppError::NotFound("resource".into()),
                    s if s.is_server_error() => AppError::Upstream { status: s.as_u16() },
                    s => AppError::Rejected {
                        status: s.as_u16(),
                        message: "Injected failure".into(),
                    },
                })
            }
        }
    }

    pub fn booking(&self, id: &str) -> Option<&Booking> {
        self.bookings.get(id).map(|r| &r.booking)
    }

    pub fn intent(&self, id: &str) -> Option<&PaymentIntent> {
        self.intents.get(id)
    }

    pub fn document(&self, id: &str) -> Option<&Document> {
        self.documents.get(id)
    }

    fn booking_for(&self, user_id: Uuid, role: Role, booking_id: &str) -> AppResult<&BookingRecord> {
        let record = self
            .bookings
            .get(booking_id)
            .ok_or_else(|| AppError::NotFound("booking".into()))?;
        if role != Role::Admin && record.tenant_id != user_id {
            return Err(AppError::NotFound("booking".into()));
        }
        Ok(record)
    }

    pub fn get_booking(&self, user_id: Uuid, role: Role, booking_id: &str) -> AppResult<Booking> {
        Ok(self.booking_for(user_id, role, booking_id)?.booking.clone())
    }

    pub fn create_payment_intent(
        &mut self,
        user_id: Uuid,
        role: Role,
        booking_id: &str,
        setup_future_usage: Option<bool>,
    ) -> AppResult<PaymentIntent> {
        *self
            .counters
            .intents_by_booking
            .entry(booking_id.to_string())
            .or_default() += 1;

        let booking = &self.booking_for(user_id, role, booking_id)?.booking;
        if booking.is_paid {
            return Err(AppError::Rejected {
                status: 400,
                message: "Booking already paid".into(),
            });
        }
        if booking.status.is_terminal() {
            return Err(AppError::Rejected {
                status: 400,
                message: "Booking can no longer be paid".into(),
            });
        }

        let id = format!("pi_{}", Uuid::new_v4().simple());
        let intent = PaymentIntent {
            client_secret: format!("{id}_secret_{}", Uuid::new_v4().simple()),
            id: id.clone(),
            status: PaymentIntentStatus::RequiresPaymentMethod,
            booking_id: booking.id.clone(),
            amount: booking.total_price,
            currency: "usd".into(),
            setup_future_usage,
        };
        self.intents.insert(id.clone(), intent.clone());
        self.audit.record(
            Some(user_id),
            "payment_intent_created",
            Some("bookings"),
            Some(serde_json::json!({ "booking_id": booking_id, "intent_id": id })),
        );
        Ok(intent)
    }

    pub fn process_payment(
        &mut self,
        user_id: Uuid,
        role: Role,
        intent_id: &str,
        payment_method_id: &str,
    ) -> AppResult<()> {
        self.counters.process_payment += 1;
        if payment_method_id.trim().is_empty() {
            return Err(AppError::Validation("payment_method_id is required".into()));
        }
        let intent = self
            .intents
            .get(intent_id)
            .ok_or_else(|| AppError::NotFound("payment".into()))?
            .clone();
        self.booking_for(user_id, role, &intent.booking_id)?;

        if intent.status == PaymentIntentStatus::Succeeded {
            return Ok(());
        }

        if let Some(stored) = self.intents.get_mut(intent_id) {
            stored.status = PaymentIntentStatus::Succeeded;
        }
        if let Some(record) = self.bookings.get_mut(&intent.booking_id) {
            record.booking.is_paid = true;
            record.booking.status = BookingStatus::Confirmed;
        }
        self.audit.record(
            Some(user_id),
            "booking_paid",
            Some("bookings"),
            Some(serde_json::json!({ "booking_id": intent.booking_id, "intent_id": intent_id })),
        );
        Ok(())
    }

    pub fn properties_of(&self, owner_id: Uuid) -> Vec<PropertySummary> {
        let mut items: Vec<_> = self
            .properties
            .values()
            .filter(|p| p.owner_id == owner_id)
            .map(|p| p.summary.clone())
            .collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        items
    }

    pub fn property(&self, property_id: &str) -> AppResult<PropertySummary> {
        self.properties
            .get(property_id)
            .map(|p| p.summary.clone())
            .ok_or_else(|| AppError::NotFound("property".into()))
    }

    fn ensure_property_access(&self, user_id: Uuid, role: Role, property_id: &str) -> AppResult<()> {
        let record = self
            .properties
            .get(property_id)
            .ok_or_else(|| AppError::NotFound("property".into()))?;
        if role != Role::Admin && record.owner_id != user_id {
            return Err(AppError::Forbidden("property".into()));
        }
        Ok(())
    }

    pub fn property_documents(
        &self,
        user_id: Uuid,
        role: Role,
        property_id: &str,
    ) -> AppResult<Vec<DocumentSummary>> {
        self.ensure_property_access(user_id, role, property_id)?;
        Ok(self.document_summaries(|d| d.property.id == property_id))
    }

    pub fn document_summaries(&self, filter: impl Fn(&Document) -> bool) -> Vec<DocumentSummary> {
        let mut items: Vec<_> = self
            .documents
            .values()
            .filter(|&d| filter(d))
            .map(|d| DocumentSummary {
                id: d.id.clone(),
                property_id: d.property.id.clone(),
                document_type: d.document_type.clone(),
                status: d.status,
                feedback_read: d.feedback_read,
                created_at: d.created_at,
            })
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        items
    }

    fn document_mut(
        &mut self,
        user_id: Uuid,
        role: Role,
        property_id: &str,
        document_id: &str,
    ) -> AppResult<&mut Document> {
        self.ensure_property_access(user_id, role, property_id)?;
        self.documents
            .get_mut(document_id)
            .filter(|d| d.property.id == property_id)
            .ok_or_else(|| AppError::NotFound("document".into()))
    }

    pub fn get_document(
        &mut self,
        user_id: Uuid,
        role: Role,
        property_id: &str,
        document_id: &str,
    ) -> AppResult<Document> {
        self.counters.get_document += 1;
        Ok(self
            .document_mut(user_id, role, property_id, document_id)?
            .clone())
    }

    pub fn add_feedback(
        &mut self,
        user_id: Uuid,
        role: Role,
        property_id: &str,
        document_id: &str,
        text: &str,
        now: DateTime<Utc>,
    ) -> AppResult<FeedbackMessage> {
        self.counters.add_feedback += 1;
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("Message cannot be empty".into()));
        }
        let document = self.document_mut(user_id, role, property_id, document_id)?;
        let message = FeedbackMessage {
            id: format!("fb_{}", Uuid::new_v4().simple()),
            message: text.to_string(),
            sender_type: role.sender_type(),
            created_at: now,
            is_read: false,
        };
        document.feedback_thread.push(message.clone());
        if role == Role::Admin {
            document.feedback_read = false;
        }
        self.audit.record(
            Some(user_id),
            "feedback_added",
            Some("documents"),
            Some(serde_json::json!({ "document_id": document_id })),
        );
        Ok(message)
    }

    pub fn mark_feedback_read(
        &mut self,
        user_id: Uuid,
        role: Role,
        property_id: &str,
        document_id: &str,
    ) -> AppResult<()> {
        self.counters.mark_feedback_read += 1;
        let reader = role.sender_type();
        let document = self.document_mut(user_id, role, property_id, document_id)?;
        for message in document
            .feedback_thread
            .iter_mut()
            .filter(|m| m.sender_type != reader)
        {
            message.is_read = true;
        }
        if role != Role::Admin {
            document.feedback_read = true;
        }
        Ok(())
    }

    pub fn review_document(
        &mut self,
        admin_id: Uuid,
        property_id: &str,
        document_id: &str,
        decision: ReviewDecision,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<Document> {
        let reason = reason.map(str::trim).filter(|r| !r.is_empty());
        if decision == ReviewDecision::Reject && reason.is_none() {
            return Err(AppError::Validation("A rejection reason is required".into()));
        }
        let document = self.document_mut(admin_id, Role::Admin, property_id, document_id)?;
        match decision {
            ReviewDecision::Approve => {
                document.status = DocumentStatus::Approved;
                document.rejection_reason = None;
            }
            ReviewDecision::Reject => {
                let reason = reason.unwrap_or_default().to_string();
                document.status = DocumentStatus::Rejected;
                document.feedback_thread.push(FeedbackMessage {
                    id: format!("fb_{}", Uuid::new_v4().simple()),
                    message: format!("Document rejected: {reason}"),
                    sender_type: SenderType::Admin,
                    created_at: now,
                    is_read: false,
                });
                document.feedback_read = false;
                document.rejection_reason = Some(reason);
            }
        }
        let document = document.clone();
        self.audit.record(
            Some(admin_id),
            "document_reviewed",
            Some("documents"),
            Some(serde_json::json!({ "document_id": document_id, "status": document.status })),
        );
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn landlord_and_store() -> (Store, Uuid) {
        let store = Store::seeded().unwrap();
        let id = store.user_by_email(LANDLORD_EMAIL).unwrap().id;
        (store, id)
    }

    #[test]
    fn seeded_demo_booking_totals_450() {
        let store = Store::seeded().unwrap();
        let booking = store.booking(DEMO_BOOKING_ID).unwrap();
        assert_eq!(booking.total_price, 45_000);
        assert!(booking.totals_consistent());
        assert!(booking.is_chargeable());
    }

    #[test]
    fn login_checks_password() {
        let store = Store::seeded().unwrap();
        assert!(store.verify_login(TENANT_EMAIL, TENANT_PASSWORD).is_ok());
        assert!(matches!(
            store.verify_login(TENANT_EMAIL, "wrong"),
            Err(AppError::Rejected { status: 400, .. })
        ));
    }

    #[test]
    fn other_tenants_cannot_see_booking() {
        let store = Store::seeded().unwrap();
        let stranger = Uuid::new_v4();
        assert!(matches!(
            store.get_booking(stranger, Role::Tenant, DEMO_BOOKING_ID),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn paid_booking_rejects_new_intent() {
        let mut store = Store::seeded().unwrap();
        let tenant = store.user_by_email(TENANT_EMAIL).unwrap().id;
        let err = store
            .create_payment_intent(tenant, Role::Tenant, PAID_BOOKING_ID, None)
            .unwrap_err();
        assert_eq!(err.to_string(), "Booking already paid");
    }

    #[test]
    fn processing_marks_booking_paid_once() {
        let mut store = Store::seeded().unwrap();
        let tenant = store.user_by_email(TENANT_EMAIL).unwrap().id;
        let intent = store
            .create_payment_intent(tenant, Role::Tenant, DEMO_BOOKING_ID, None)
            .unwrap();
        store.process_payment(tenant, Role::Tenant, &intent.id, "pm_1").unwrap();
        store.process_payment(tenant, Role::Tenant, &intent.id, "pm_1").unwrap();
        let booking = store.booking(DEMO_BOOKING_ID).unwrap();
        assert!(booking.is_paid);
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(store.audit.count("booking_paid"), 1);
    }

    #[test]
    fn mark_read_only_touches_counterparty_messages() {
        let (mut store, landlord) = landlord_and_store();
        store
            .mark_feedback_read(landlord, Role::Landlord, DEMO_PROPERTY_ID, DEMO_DOCUMENT_ID)
            .unwrap();
        let doc = store.document(DEMO_DOCUMENT_ID).unwrap();
        assert!(doc.feedback_read);
        assert!(doc.feedback_thread.iter().all(|m| m.is_read));
    }

    #[test]
    fn document_of_other_property_is_not_found() {
        let (mut store, landlord) = landlord_and_store();
        assert!(matches!(
            store.get_document(landlord, Role::Landlord, SECOND_PROPERTY_ID, DEMO_DOCUMENT_ID),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn rejecting_requires_reason_and_posts_feedback() {
        let (mut store, _) = landlord_and_store();
        let admin = store.user_by_email(ADMIN_EMAIL).unwrap().id;
        assert!(matches!(
            store.review_document(admin, DEMO_PROPERTY_ID, DEMO_DOCUMENT_ID, ReviewDecision::Reject, Some("  "), Utc::now()),
            Err(AppError::Validation(_))
        ));
        let doc = store
            .review_document(admin, DEMO_PROPERTY_ID, DEMO_DOCUMENT_ID, ReviewDecision::Reject, Some("Blurry scan"), Utc::now())
            .unwrap();
        assert_eq!(doc.status, DocumentStatus::Rejected);
        assert_eq!(doc.rejection_reason.as_deref(), Some("Blurry scan"));
        assert!(!doc.feedback_read);
        assert_eq!(doc.feedback_thread.last().unwrap().sender_type, SenderType::Admin);
    }
}
