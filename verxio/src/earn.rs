//! Earn-pool delegate contract.
//!
//! Deposit and withdraw actions are not implemented by the checkout: they
//! are forwarded to an external yield-bearing pool behind the [`EarnPool`]
//! trait. The checkout validates the request shape, hands it to the
//! delegate, and forwards the delegate's receipt or failure message
//! unchanged. Retry and backpressure policy belong to the delegate.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EarnPoolError;

/// Additional fields a pool may attach to a receipt.
pub type Extensions = HashMap<String, Value>;

/// Deposit action forwarded to the earn pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
    /// Voucher the deposit is credited against.
    pub voucher_address: String,
    /// Amount to deposit, in USDC.
    pub amount_usdc: f64,
}

/// Withdraw action forwarded to the earn pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    /// Voucher the withdrawal is debited from.
    pub voucher_address: String,
    /// Amount to withdraw, in yield-bearing USDC+.
    pub amount_usdc_plus: f64,
}

/// Result object a pool returns for an accepted action.
///
/// Pools are free to attach fields beyond the core shape; they are carried
/// in [`extra`](Self::extra) and forwarded to the caller unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EarnReceipt {
    /// Whether the pool accepted the action.
    pub success: bool,
    /// Settlement transaction signature, when the pool reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Any additional fields the pool attached.
    #[serde(flatten)]
    pub extra: Extensions,
}

impl EarnReceipt {
    /// An accepted receipt carrying a settlement signature.
    #[must_use]
    pub fn accepted(signature: impl Into<String>) -> Self {
        Self {
            success: true,
            signature: Some(signature.into()),
            extra: Extensions::new(),
        }
    }
}

/// The yield-bearing pool the checkout delegates earn actions to.
///
/// Implementations are injected into the HTTP handlers; the checkout itself
/// never constructs one implicitly.
#[async_trait]
pub trait EarnPool: Send + Sync {
    /// Deposits USDC against a voucher.
    async fn deposit(&self, request: &DepositRequest) -> Result<EarnReceipt, EarnPoolError>;

    /// Withdraws accrued USDC+ back to a voucher.
    async fn withdraw(&self, request: &WithdrawRequest) -> Result<EarnReceipt, EarnPoolError>;
}
