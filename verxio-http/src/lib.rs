#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! HTTP transport layer for the Verxio checkout.
//!
//! Provides the client for the remote reflect earn-pool service and the
//! session middleware that binds incoming requests to checkout sessions.
//!
//! # Modules
//!
//! - [`constants`] — HTTP header names and default service URLs
//! - [`reflect`] — HTTP earn-pool client (feature: `client`)
//! - [`session`] — session registry and axum middleware (feature: `server`)

pub mod constants;

#[cfg(feature = "client")]
pub mod reflect;

#[cfg(feature = "server")]
pub mod session;
