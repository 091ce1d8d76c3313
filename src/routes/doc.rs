use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::routes::{admin, auth, bookings, health, payments, properties};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        bookings::get_booking,
        bookings::create_payment_intent,
        payments::process_payment,
        properties::list_my_properties,
        properties::get_property,
        properties::list_documents,
        properties::get_document,
        properties::add_feedback,
        properties::mark_feedback_read,
        admin::list_documents,
        admin::review_document
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Bookings", description = "Booking and payment intent endpoints"),
        (name = "Payments", description = "Payment reconciliation endpoints"),
        (name = "Properties", description = "Landlord property endpoints"),
        (name = "Documents", description = "Verification documents and feedback threads"),
        (name = "Admin", description = "Document moderation endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
