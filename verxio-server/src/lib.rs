//! Verxio checkout gateway server.
//!
//! Hosts the checkout REST surface: earn-pool deposit and withdrawal
//! forwarding, session-bound context reporting, and referral management,
//! with Axum route handlers behind the session middleware.
//!
//! # Modules
//!
//! - [`handlers`] — Axum route handlers and router builder
//! - [`error`] — Checkout service error types
//! - [`config`] — Server configuration with environment variable expansion

pub mod config;
pub mod error;
pub mod handlers;

pub use handlers::{CheckoutState, checkout_router};
