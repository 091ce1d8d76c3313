//! Payment Intent Adapter: one interface over the real card SDK and the offline stand-in.

pub mod adapter;
pub mod card;
pub mod mock;
pub mod provider;
pub mod stripe;

pub use adapter::{ConfirmedCharge, IntentOptions, PaymentAdapter, PaymentReceipt};
pub use card::CardDetails;
pub use mock::MockProvider;
pub use provider::{ConfirmOutcome, ConfirmedIntent, PaymentProvider};
pub use stripe::StripeProvider;
