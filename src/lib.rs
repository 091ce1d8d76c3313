//! Client-side checkout and document-feedback core for the rental marketplace.
//!
//! The [`api`] clients talk to the marketplace REST backend, [`payment`]
//! hides which card provider is in use, [`checkout`] runs the booking
//! payment flow and [`feedback`] keeps a document's verification thread.
//! The [`routes`], [`store`] and [`middleware`] modules make up an in-memory
//! sandbox of that backend for local development and tests.

pub mod api;
pub mod audit;
pub mod checkout;
pub mod config;
pub mod dto;
pub mod error;
pub mod feedback;
pub mod middleware;
pub mod models;
pub mod payment;
pub mod response;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;
