#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the Verxio checkout flow.
//!
//! This crate implements the stateful heart of the checkout: which session
//! context a page tree runs under, how a referral code is captured and kept
//! for attribution, and the contract for the external earn pool that
//! deposit/withdraw actions delegate to. Transport and server wiring live in
//! separate crates.
//!
//! # Overview
//!
//! On every navigation the route classifier inspects the path and the
//! provider selector mounts exactly one of two context variants around the
//! page subtree: a wallet-enabled context for payment and product flows, or
//! the default context for everything else. Inside that tree, checkout
//! actions read the referral store to recover a previously captured
//! attribution code. Deposit and withdraw actions are forwarded untouched to
//! an injected earn-pool delegate.
//!
//! # Modules
//!
//! - [`earn`] - Earn-pool delegate contract and wire shapes
//! - [`error`] - Delegate failure taxonomy
//! - [`gate`] - One-shot page readiness gate
//! - [`networks`] - Solana cluster definitions and USDC deployments
//! - [`referral`] - Referral code capture and persistence
//! - [`route`] - Path classification into context kinds
//! - [`session`] - Context providers and the provider selector
//! - [`storage`] - Injected client-state persistence capability

pub mod earn;
pub mod error;
pub mod gate;
pub mod networks;
pub mod referral;
pub mod route;
pub mod session;
pub mod storage;
