//! Axum route handlers for the checkout gateway.
//!
//! Provides REST endpoints forwarding deposits and withdrawals to the earn
//! pool, plus session introspection. Every route runs behind
//! [`SessionLayer`], which binds the request to a checkout session and
//! injects the [`ActiveContext`] snapshot handlers read.

use std::sync::{Arc, PoisonError};

use axum::Json;
use axum::extract::{Extension, State};
use verxio::earn::{DepositRequest, EarnPool, EarnReceipt, WithdrawRequest};
use verxio_http::session::{ActiveContext, SessionLayer, SessionRegistry};

use crate::error::ApiError;

/// Shared application state for the checkout gateway.
#[derive(Clone)]
pub struct CheckoutState {
    /// Earn pool deposits and withdrawals are forwarded to.
    pub pool: Arc<dyn EarnPool>,
    /// Registry of live checkout sessions.
    pub registry: Arc<SessionRegistry>,
}

impl std::fmt::Debug for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutState")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// `POST /api/reflect/deposit` — Forwards a deposit to the earn pool.
///
/// # Errors
///
/// Returns 400 when the body is not a valid deposit request, or 500 when
/// the pool rejects or fails the operation.
pub async fn post_deposit(
    State(state): State<CheckoutState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<EarnReceipt>, ApiError> {
    let request: DepositRequest =
        serde_json::from_value(body).map_err(|_| ApiError::InvalidPayload)?;
    if request.voucher_address.is_empty() {
        return Err(ApiError::InvalidPayload);
    }
    let receipt = state.pool.deposit(&request).await?;
    Ok(Json(receipt))
}

/// `POST /api/reflect/withdraw` — Forwards a withdrawal to the earn pool.
///
/// # Errors
///
/// Returns 400 when the body is not a valid withdraw request, or 500 when
/// the pool rejects or fails the operation.
pub async fn post_withdraw(
    State(state): State<CheckoutState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<EarnReceipt>, ApiError> {
    let request: WithdrawRequest =
        serde_json::from_value(body).map_err(|_| ApiError::InvalidPayload)?;
    if request.voucher_address.is_empty() {
        return Err(ApiError::InvalidPayload);
    }
    let receipt = state.pool.withdraw(&request).await?;
    Ok(Json(receipt))
}

/// `GET /api/session` — Returns the caller's active checkout context.
pub async fn get_session(Extension(active): Extension<ActiveContext>) -> Json<ActiveContext> {
    Json(active)
}

/// `DELETE /api/session/referral` — Clears the session's referral attribution.
///
/// Clearing is idempotent: a session with nothing stored still reports
/// success.
pub async fn delete_referral(
    State(state): State<CheckoutState>,
    Extension(active): Extension<ActiveContext>,
) -> Json<serde_json::Value> {
    if let Some(session) = state.registry.get(&active.session_id) {
        let session = session.lock().unwrap_or_else(PoisonError::into_inner);
        session.referral().clear();
    }
    Json(serde_json::json!({ "success": true }))
}

/// Creates an Axum [`axum::Router`] with all checkout endpoints.
///
/// Endpoints:
/// - `POST /api/reflect/deposit` — forward a deposit to the earn pool
/// - `POST /api/reflect/withdraw` — forward a withdrawal to the earn pool
/// - `GET /api/session` — the caller's active context snapshot
/// - `DELETE /api/session/referral` — clear the session's referral code
///
/// Every route runs behind [`SessionLayer`], so responses carry the
/// `x-verxio-session` header and `?ref=` codes are captured on any route.
pub fn checkout_router(state: CheckoutState) -> axum::Router {
    axum::Router::new()
        .route("/api/reflect/deposit", axum::routing::post(post_deposit))
        .route("/api/reflect/withdraw", axum::routing::post(post_withdraw))
        .route("/api/session", axum::routing::get(get_session))
        .route(
            "/api/session/referral",
            axum::routing::delete(delete_referral),
        )
        .layer(SessionLayer::new(Arc::clone(&state.registry)))
        .with_state(state)
}
