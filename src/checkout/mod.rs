//! Checkout State Machine.
//!
//! `Idle -> Loading -> Ready -> Submitting -> Succeeded | Failed`, with
//! `Error` for loads that cannot be completed. A declined card returns to a
//! payable `Failed` state; a charge that went through but could not be
//! recorded leaves a `Failed` state that only accepts
//! [`CheckoutController::retry_reconciliation`].

pub mod controller;
pub mod navigator;
pub mod state;

pub use controller::CheckoutController;
pub use navigator::{ChannelNavigator, Navigator, Route};
pub use state::{CheckoutContext, CheckoutFailure, CheckoutState, NextAction, StatusView, format_money};
