//! Session tracking for checkout requests.
//!
//! Every request runs against one [`CheckoutSession`]: the session's
//! provider selector decides which context the page tree gets, and its
//! referral store keeps the attribution code captured from page URLs.
//!
//! The [`SessionLayer`] middleware resolves the session from the
//! `x-verxio-session` request header (minting a fresh id when the header is
//! absent), records the navigation, and exposes the resulting
//! [`ActiveContext`] to handlers through request extensions. The session id
//! is echoed on every response so clients can carry it forward.

pub mod layer;
pub mod registry;

pub use layer::{SessionLayer, SessionService};
pub use registry::{
    ActiveContext, CheckoutSession, SessionBuilder, SessionId, SessionRegistry, SharedSession,
};
