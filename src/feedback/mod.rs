//! Feedback Thread Controller for document verification conversations.

pub mod controller;
pub mod thread;

pub use controller::FeedbackController;
pub use thread::FeedbackThread;
