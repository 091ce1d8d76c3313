use crate::{
    checkout::Route,
    error::{AppError, ErrorKind},
    models::{Booking, PaymentIntent},
    payment::PaymentReceipt,
};

/// Booking and intent loaded for one checkout mount.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutContext {
    pub booking: Booking,
    pub intent: PaymentIntent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutFailure {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
    /// Support reference, set when a charge went through but was not recorded.
    pub reference: Option<String>,
}

impl CheckoutFailure {
    pub fn from_error(err: &AppError) -> Self {
        let reference = match err {
            AppError::Reconciliation { reference, .. } => Some(reference.clone()),
            _ => None,
        };
        let message = match err {
            AppError::Reconciliation { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Self {
            kind: err.kind(),
            message,
            retryable: err.is_retryable(),
            reference,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutState {
    Idle,
    Loading { booking_id: String },
    Ready(CheckoutContext),
    Submitting(CheckoutContext),
    Succeeded {
        context: CheckoutContext,
        receipt: PaymentReceipt,
        redirect_to: Route,
    },
    Failed {
        context: CheckoutContext,
        failure: CheckoutFailure,
    },
    /// Loading failed or the intent was spent; only a fresh mount leaves this state.
    Error(CheckoutFailure),
}

/// What the user can do next from a given state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextAction {
    Wait,
    Pay,
    Retry,
    TryAgain,
    GoBack(Route),
    ContactSupport { reference: String },
    Login,
    Redirecting(Route),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    pub headline: String,
    pub detail: String,
    pub action: NextAction,
}

impl StatusView {
    fn new(headline: &str, detail: impl Into<String>, action: NextAction) -> Self {
        Self {
            headline: headline.to_string(),
            detail: detail.into(),
            action,
        }
    }
}

impl CheckoutState {
    pub fn name(&self) -> &'static str {
        match self {
            CheckoutState::Idle => "idle",
            CheckoutState::Loading { .. } => "loading",
            CheckoutState::Ready(_) => "ready",
            CheckoutState::Submitting(_) => "submitting",
            CheckoutState::Succeeded { .. } => "succeeded",
            CheckoutState::Failed { .. } => "failed",
            CheckoutState::Error(_) => "error",
        }
    }

    pub fn context(&self) -> Option<&CheckoutContext> {
        match self {
            CheckoutState::Ready(ctx) | CheckoutState::Submitting(ctx) => Some(ctx),
            CheckoutState::Succeeded { context, .. } | CheckoutState::Failed { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&CheckoutFailure> {
        match self {
            CheckoutState::Failed { failure, .. } | CheckoutState::Error(failure) => Some(failure),
            _ => None,
        }
    }

    /// Whether a card submission would be accepted right now.
    pub fn can_submit(&self) -> bool {
        match self {
            CheckoutState::Ready(_) => true,
            CheckoutState::Failed { failure, .. } => failure.retryable,
            _ => false,
        }
    }

    pub fn view(&self) -> StatusView {
        match self {
            CheckoutState::Idle => StatusView::new("Checkout", "Preparing checkout", NextAction::Wait),
            CheckoutState::Loading { .. } => {
                StatusView::new("Loading your booking", "Fetching booking details", NextAction::Wait)
            }
            CheckoutState::Ready(ctx) => StatusView::new(
                "Complete your booking",
                summary(ctx),
                NextAction::Pay,
            ),
            CheckoutState::Submitting(_) => {
                StatusView::new("Processing payment", "Do not close this page", NextAction::Wait)
            }
            CheckoutState::Succeeded { redirect_to, .. } => StatusView::new(
                "Payment successful",
                "Redirecting to your confirmation",
                NextAction::Redirecting(redirect_to.clone()),
            ),
            CheckoutState::Failed { failure, .. } => failure_view(failure),
            CheckoutState::Error(failure) => load_error_view(failure),
        }
    }
}

fn failure_view(failure: &CheckoutFailure) -> StatusView {
    match failure.kind {
        ErrorKind::Reconciliation => StatusView::new(
            "Payment needs attention",
            failure.message.clone(),
            NextAction::ContactSupport {
                reference: failure.reference.clone().unwrap_or_default(),
            },
        ),
        ErrorKind::PaymentDeclined => {
            StatusView::new("Payment failed", failure.message.clone(), NextAction::Retry)
        }
        ErrorKind::Validation => StatusView::new(
            "Check your card details",
            failure.message.clone(),
            NextAction::Retry,
        ),
        ErrorKind::AuthRequired => {
            StatusView::new("Please sign in", failure.message.clone(), NextAction::Login)
        }
        ErrorKind::NotFound => StatusView::new(
            "Booking not found",
            failure.message.clone(),
            NextAction::GoBack(Route::Bookings),
        ),
        ErrorKind::TransientNetwork => StatusView::new(
            "Connection problem",
            failure.message.clone(),
            NextAction::TryAgain,
        ),
    }
}

fn load_error_view(failure: &CheckoutFailure) -> StatusView {
    match failure.kind {
        ErrorKind::TransientNetwork => StatusView::new(
            "We couldn't load checkout",
            failure.message.clone(),
            NextAction::TryAgain,
        ),
        ErrorKind::AuthRequired => {
            StatusView::new("Please sign in", failure.message.clone(), NextAction::Login)
        }
        ErrorKind::PaymentDeclined => StatusView::new(
            "Payment could not be completed",
            failure.message.clone(),
            NextAction::TryAgain,
        ),
        _ => StatusView::new(
            "This booking can't be paid",
            failure.message.clone(),
            NextAction::GoBack(Route::Bookings),
        ),
    }
}

fn summary(ctx: &CheckoutContext) -> String {
    let booking = &ctx.booking;
    let nights = booking.nights();
    format!(
        "{} in {}, {}: {} night{}, total {}",
        booking.property.title,
        booking.property.city,
        booking.property.state,
        nights,
        if nights == 1 { "" } else { "s" },
        format_money(booking.total_price)
    )
}

/// Formats minor units as dollars, e.g. `45000` as `$450.00`.
pub fn format_money(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}${}.{:02}", abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_formatting() {
        assert_eq!(format_money(45_000), "$450.00");
        assert_eq!(format_money(5), "$0.05");
        assert_eq!(format_money(-1_250), "-$12.50");
    }

    #[test]
    fn reconciliation_failure_points_to_support() {
        let failure = CheckoutFailure::from_error(&AppError::Reconciliation {
            reference: "pi_9".into(),
            message: "Your payment went through, but we couldn't record it. Please contact support".into(),
        });
        assert!(!failure.retryable);
        let view = failure_view(&failure);
        assert_eq!(
            view.action,
            NextAction::ContactSupport {
                reference: "pi_9".into()
            }
        );
    }

    #[test]
    fn every_failure_kind_offers_an_action() {
        let errors = [
            AppError::PaymentDeclined("Your card was declined.".into()),
            AppError::Validation("Your card number is incomplete.".into()),
            AppError::TransientNetwork("could not reach the server".into()),
            AppError::NotFound("booking".into()),
            AppError::IntentCreation("Booking already paid".into()),
            AppError::AuthRequired,
        ];
        for err in errors {
            let failure = CheckoutFailure::from_error(&err);
            assert_ne!(failure_view(&failure).action, NextAction::Wait);
            assert_ne!(load_error_view(&failure).action, NextAction::Wait);
            assert!(!failure.message.is_empty());
        }
    }
}
