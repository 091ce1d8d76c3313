use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::task::JoinHandle;

use crate::{
    api::BookingService,
    checkout::{
        CheckoutContext, CheckoutFailure, CheckoutState, Navigator, Route, StatusView,
    },
    error::{AppError, AppResult},
    payment::{CardDetails, ConfirmedCharge, IntentOptions, PaymentAdapter, PaymentReceipt},
    session::SessionProvider,
};

struct Inner {
    state: CheckoutState,
    /// Bumped on every mount and unmount; async results carrying an older value are dropped.
    generation: u64,
    mounted: Option<String>,
    pending_charge: Option<ConfirmedCharge>,
    redirect: Option<JoinHandle<()>>,
}

impl Inner {
    fn cancel_redirect(&mut self) {
        if let Some(handle) = self.redirect.take() {
            handle.abort();
        }
    }
}

/// Drives one checkout view: load booking and intent, take the card, settle the payment.
#[derive(Clone)]
pub struct CheckoutController {
    inner: Arc<Mutex<Inner>>,
    bookings: BookingService,
    payments: PaymentAdapter,
    session: Arc<dyn SessionProvider>,
    navigator: Arc<dyn Navigator>,
    redirect_delay: Duration,
    intent_options: IntentOptions,
}

impl CheckoutController {
    pub fn new(
        bookings: BookingService,
        payments: PaymentAdapter,
        session: Arc<dyn SessionProvider>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: CheckoutState::Idle,
                generation: 0,
                mounted: None,
                pending_charge: None,
                redirect: None,
            })),
            bookings,
            payments,
            session,
            navigator,
            redirect_delay: Duration::from_secs(2),
            intent_options: IntentOptions::default(),
        }
    }

    pub fn with_redirect_delay(mut self, delay: Duration) -> Self {
        self.redirect_delay = delay;
        self
    }

    /// Ask the backend to keep the card on file for future charges.
    pub fn with_intent_options(mut self, options: IntentOptions) -> Self {
        self.intent_options = options;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> CheckoutState {
        self.lock().state.clone()
    }

    pub fn view(&self) -> StatusView {
        self.lock().state.view()
    }

    /// Loads the booking and creates its payment intent.
    ///
    /// Mounting again with the booking already mounted does nothing, so one
    /// mount creates at most one intent.
    pub async fn mount(&self, booking_id: &str) {
        let generation = {
            let mut inner = self.lock();
            if inner.mounted.as_deref() == Some(booking_id) {
                tracing::debug!(booking_id, "checkout already mounted");
                return;
            }
            inner.cancel_redirect();
            inner.generation += 1;
            inner.pending_charge = None;

            if self.session.current().is_none() {
                inner.mounted = None;
                inner.state = CheckoutState::Idle;
                drop(inner);
                tracing::info!(booking_id, "checkout requires sign-in");
                self.navigator.navigate(login_route(booking_id));
                return;
            }

            inner.mounted = Some(booking_id.to_string());
            inner.state = CheckoutState::Loading {
                booking_id: booking_id.to_string(),
            };
            inner.generation
        };

        let result = self.load(booking_id).await;

        let mut inner = self.lock();
        if inner.generation != generation {
            tracing::debug!(booking_id, "discarding stale checkout load");
            return;
        }
        match result {
            Ok(context) => {
                tracing::info!(booking_id, intent_id = %context.intent.id, "checkout ready");
                inner.state = CheckoutState::Ready(context);
            }
            Err(AppError::AuthRequired) => {
                inner.mounted = None;
                inner.state = CheckoutState::Idle;
                drop(inner);
                self.navigator.navigate(login_route(booking_id));
            }
            Err(err) => {
                tracing::warn!(booking_id, error = %err, "checkout failed to load");
                inner.state = CheckoutState::Error(CheckoutFailure::from_error(&err));
            }
        }
    }

    async fn load(&self, booking_id: &str) -> AppResult<CheckoutContext> {
        let booking = self.bookings.get_booking_by_id(booking_id).await?;
        if !booking.is_chargeable() {
            let reason = if booking.is_paid {
                "this booking has already been paid"
            } else {
                "this booking is no longer active"
            };
            return Err(AppError::IntentCreation(reason.to_string()));
        }
        let intent = self
            .payments
            .create_intent(booking_id, self.intent_options)
            .await?;
        Ok(CheckoutContext { booking, intent })
    }

    /// Pays with `card`. Returns `false` when the submission was ignored
    /// (not ready, already submitting, or blocked after an unrecorded charge).
    pub async fn submit(&self, card: &CardDetails, save_card: bool) -> bool {
        let (generation, context) = {
            let mut inner = self.lock();
            if !inner.state.can_submit() {
                tracing::debug!(state = inner.state.name(), "submit ignored");
                return false;
            }
            let Some(context) = inner.state.context().cloned() else {
                return false;
            };
            if let Err(err) = card.validate() {
                inner.state = CheckoutState::Failed {
                    context,
                    failure: CheckoutFailure::from_error(&err),
                };
                return true;
            }
            inner.state = CheckoutState::Submitting(context.clone());
            (inner.generation, context)
        };

        let charge = match self
            .payments
            .confirm_charge(&context.intent, card, save_card)
            .await
        {
            Ok(charge) => charge,
            Err(err) => {
                self.apply_failure(generation, context, &err);
                return true;
            }
        };

        // The charge is real from here on; record it even if the view went away.
        let result = self.payments.reconcile(&charge).await;
        self.apply_settlement(generation, context, charge, result);
        true
    }

    /// Re-sends an unrecorded charge to the backend. The card is not charged again.
    pub async fn retry_reconciliation(&self) -> bool {
        let (generation, context, charge) = {
            let mut inner = self.lock();
            let Some(charge) = inner.pending_charge.clone() else {
                return false;
            };
            let CheckoutState::Failed { context, .. } = &inner.state else {
                return false;
            };
            let context = context.clone();
            inner.state = CheckoutState::Submitting(context.clone());
            (inner.generation, context, charge)
        };

        let result = self.payments.reconcile(&charge).await;
        self.apply_settlement(generation, context, charge, result);
        true
    }

    fn apply_failure(&self, generation: u64, context: CheckoutContext, err: &AppError) {
        let mut inner = self.lock();
        if inner.generation != generation {
            return;
        }
        let failure = CheckoutFailure::from_error(err);
        inner.state = if matches!(err, AppError::IntentExpired(_)) {
            // The client secret is spent; only a reload with a new intent can continue.
            CheckoutState::Error(failure)
        } else {
            CheckoutState::Failed { context, failure }
        };
    }

    fn apply_settlement(
        &self,
        generation: u64,
        context: CheckoutContext,
        charge: ConfirmedCharge,
        result: AppResult<PaymentReceipt>,
    ) {
        let mut inner = self.lock();
        if inner.generation != generation {
            tracing::debug!(intent_id = %charge.intent_id, "payment settled after unmount");
            return;
        }
        match result {
            Ok(receipt) => {
                inner.pending_charge = None;
                let redirect_to = Route::CheckoutSuccess {
                    booking_id: receipt.booking_id.clone(),
                };
                inner.state = CheckoutState::Succeeded {
                    context,
                    receipt,
                    redirect_to: redirect_to.clone(),
                };
                inner.cancel_redirect();
                let navigator = Arc::clone(&self.navigator);
                let delay = self.redirect_delay;
                inner.redirect = Some(tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    navigator.navigate(redirect_to);
                }));
            }
            Err(err) => {
                inner.pending_charge = Some(charge);
                inner.state = CheckoutState::Failed {
                    context,
                    failure: CheckoutFailure::from_error(&err),
                };
            }
        }
    }

    /// Tears the view down: pending results are dropped and the success redirect is cancelled.
    pub fn unmount(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.mounted = None;
        inner.pending_charge = None;
        inner.cancel_redirect();
        inner.state = CheckoutState::Idle;
    }

    /// Leaves an `Error` state by mounting afresh, which creates a new payment intent.
    pub async fn reload(&self) {
        let booking_id = {
            let inner = self.lock();
            match &inner.state {
                CheckoutState::Error(_) => inner.mounted.clone(),
                _ => None,
            }
        };
        if let Some(booking_id) = booking_id {
            self.unmount();
            self.mount(&booking_id).await;
        }
    }
}

fn login_route(booking_id: &str) -> Route {
    Route::Login {
        return_to: Route::Checkout {
            booking_id: booking_id.to_string(),
        }
        .path(),
    }
}
