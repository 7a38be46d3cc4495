//! Axum middleware that binds every request to a checkout session.
//!
//! The layer resolves the session named by the `x-verxio-session` header
//! (minting one when the header is absent), records the request's path and
//! query against it — capturing any referral code and re-classifying the
//! mounted context — and inserts the resulting [`ActiveContext`] into the
//! request's extensions. The session id is echoed on the response.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, PoisonError};
use std::task::{Context, Poll};

use axum_core::extract::Request;
use axum_core::response::Response;
use http::HeaderValue;
use tower::util::BoxCloneSyncService;
use tower::{Layer, Service};

use super::registry::{ActiveContext, SessionId, SessionRegistry};
use crate::constants::SESSION_HEADER;

/// Layer that wraps routes with session tracking.
///
/// Clone it freely; all clones share one [`SessionRegistry`].
#[derive(Clone, Debug)]
pub struct SessionLayer {
    registry: Arc<SessionRegistry>,
}

impl SessionLayer {
    /// Creates a layer over a shared session registry.
    #[must_use]
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this layer resolves sessions from.
    #[must_use]
    pub const fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }
}

impl<S> Layer<S> for SessionLayer
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + Sync + 'static,
    S::Future: Send + 'static,
{
    type Service = SessionService;

    fn layer(&self, inner: S) -> Self::Service {
        SessionService {
            registry: Arc::clone(&self.registry),
            inner: BoxCloneSyncService::new(inner),
        }
    }
}

/// Service that performs session resolution around the wrapped service.
#[derive(Clone)]
#[allow(missing_debug_implementations)] // BoxCloneSyncService does not implement Debug
pub struct SessionService {
    /// Shared session registry
    registry: Arc<SessionRegistry>,
    /// The inner Axum service being wrapped
    inner: BoxCloneSyncService<Request, Response, Infallible>,
}

impl Service<Request> for SessionService {
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    /// Delegates readiness polling to the wrapped inner service.
    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    /// Resolves the session, records the navigation, and forwards the
    /// request with the session's [`ActiveContext`] attached.
    fn call(&mut self, mut req: Request) -> Self::Future {
        let registry = Arc::clone(&self.registry);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let provided = req
                .headers()
                .get(SESSION_HEADER)
                .and_then(|value| value.to_str().ok())
                .and_then(SessionId::new);
            let (id, session) = registry.resolve(provided);

            // The lock is confined to the navigation; it is never held
            // across the inner call.
            let active: ActiveContext = {
                let mut session = session.lock().unwrap_or_else(PoisonError::into_inner);
                session.navigate(req.uri().path(), req.uri().query())
            };
            tracing::debug!(
                session = %id,
                path = %active.path,
                context = %active.context.kind,
                "resolved checkout session"
            );
            req.extensions_mut().insert(active);

            let mut response = inner.call(req).await?;
            if let Ok(value) = HeaderValue::from_str(id.as_str()) {
                response.headers_mut().insert(SESSION_HEADER, value);
            }
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use axum_core::body::Body;
    use tower::ServiceExt;
    use verxio::route::ContextKind;
    use verxio::storage::MemoryStorage;

    use super::super::registry::SessionBuilder;
    use super::*;

    type Seen = Arc<Mutex<Option<ActiveContext>>>;

    fn session_service() -> (SessionService, Arc<SessionRegistry>, Seen) {
        let builder = SessionBuilder::new(Arc::new(MemoryStorage::new()))
            .with_loader_delay(Duration::from_millis(10));
        let registry = Arc::new(SessionRegistry::new(builder));
        let seen: Seen = Arc::new(Mutex::new(None));

        let sink = Arc::clone(&seen);
        let service = SessionLayer::new(Arc::clone(&registry)).layer(tower::service_fn(
            move |req: Request| {
                let sink = Arc::clone(&sink);
                async move {
                    *sink.lock().unwrap() = req.extensions().get::<ActiveContext>().cloned();
                    Ok::<_, Infallible>(Response::new(Body::empty()))
                }
            },
        ));
        (service, registry, seen)
    }

    fn request(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_layer_mints_session_and_echoes_header() {
        let (service, registry, seen) = session_service();

        let response = service.oneshot(request("/dashboard")).await.unwrap();
        let echoed = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .unwrap();

        let active = seen.lock().unwrap().clone().unwrap();
        assert_eq!(active.session_id.as_str(), echoed);
        assert_eq!(active.context.kind, ContextKind::Default);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_wallet_paths_get_wallet_context() {
        let (service, _, seen) = session_service();

        service.oneshot(request("/pay/abc")).await.unwrap();
        let active = seen.lock().unwrap().clone().unwrap();
        assert_eq!(active.context.kind, ContextKind::Wallet);
        assert_eq!(active.path, "/pay/abc");
    }

    #[tokio::test]
    async fn test_session_resumes_and_keeps_referral_across_requests() {
        let (service, _, seen) = session_service();

        let response = service
            .clone()
            .oneshot(request("/pay/abc?ref=spring25"))
            .await
            .unwrap();
        let id = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .unwrap();

        let resumed = Request::builder()
            .uri("/dashboard")
            .header(SESSION_HEADER, &id)
            .body(Body::empty())
            .unwrap();
        let response = service.oneshot(resumed).await.unwrap();

        let active = seen.lock().unwrap().clone().unwrap();
        assert_eq!(active.session_id.as_str(), id);
        assert_eq!(active.context.kind, ContextKind::Default);
        assert_eq!(
            active.referral,
            verxio::referral::ReferralCode::new("spring25")
        );
        assert_eq!(
            response.headers().get(SESSION_HEADER).and_then(|v| v.to_str().ok()),
            Some(id.as_str())
        );
    }

    #[tokio::test]
    async fn test_client_minted_id_is_adopted() {
        let (service, registry, seen) = session_service();

        let req = Request::builder()
            .uri("/about")
            .header(SESSION_HEADER, "client-chosen")
            .body(Body::empty())
            .unwrap();
        service.oneshot(req).await.unwrap();

        let active = seen.lock().unwrap().clone().unwrap();
        assert_eq!(active.session_id.as_str(), "client-chosen");
        assert!(
            registry
                .get(&SessionId::new("client-chosen").unwrap())
                .is_some()
        );
    }
}
