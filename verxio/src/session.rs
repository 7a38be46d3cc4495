//! Conditional session-context selection.
//!
//! Every page subtree runs inside exactly one of two context variants: the
//! wallet context (authentication plus Solana wallet connectivity, for
//! payment and product flows) or the default context (authentication only).
//! The [`ProviderSelector`] owns the mounted context and swaps it when a
//! navigation changes the path's classification. A swap is a full teardown
//! of the old context followed by a fresh mount of the new one; the two
//! variants share no internal state, so nothing is patched across.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::gate::LoaderGate;
use crate::networks::{SolanaCluster, USDC};
use crate::route::{ContextKind, RouteClassifier};

/// Snapshot of a mounted context, as reported by session info endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextInfo {
    /// Which context variant is mounted.
    pub kind: ContextKind,
    /// Whether the context's loader gate has opened.
    pub ready: bool,
    /// Cluster the wallet context is connected to, absent for the default
    /// context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    /// USDC mint for the connected cluster, absent for the default context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usdc_mint: Option<String>,
}

/// A mounted authentication/connectivity context.
///
/// Lives from the moment its provider mounts it until the selector swaps it
/// out or is itself dropped; teardown is the drop.
pub trait SessionContext: Send + Sync {
    /// The variant this context implements.
    fn kind(&self) -> ContextKind;

    /// Whether the context has finished initializing.
    fn is_ready(&self) -> bool {
        true
    }

    /// Reports the context's externally visible state.
    fn describe(&self) -> ContextInfo {
        ContextInfo {
            kind: self.kind(),
            ready: self.is_ready(),
            cluster: None,
            usdc_mint: None,
        }
    }
}

/// Builds session contexts of one fixed variant on demand.
pub trait ContextProvider: Send + Sync {
    /// The variant this provider mounts.
    fn kind(&self) -> ContextKind;

    /// Mounts a fresh context instance.
    fn mount(&self) -> Box<dyn SessionContext>;
}

/// Provider for the default context: authentication without wallet
/// connectivity.
#[derive(Debug, Clone, Copy)]
pub struct DefaultContextProvider {
    loader_delay: Duration,
}

impl DefaultContextProvider {
    /// Creates a provider whose contexts become ready after `loader_delay`.
    #[must_use]
    pub fn new(loader_delay: Duration) -> Self {
        Self { loader_delay }
    }
}

impl ContextProvider for DefaultContextProvider {
    fn kind(&self) -> ContextKind {
        ContextKind::Default
    }

    fn mount(&self) -> Box<dyn SessionContext> {
        Box::new(DefaultSession {
            gate: LoaderGate::start(self.loader_delay),
        })
    }
}

/// Provider for the wallet context: authentication plus Solana wallet
/// connectivity against a configured cluster.
#[derive(Debug, Clone, Copy)]
pub struct WalletContextProvider {
    cluster: SolanaCluster,
    loader_delay: Duration,
}

impl WalletContextProvider {
    /// Creates a provider that connects its contexts to `cluster`.
    #[must_use]
    pub fn new(cluster: SolanaCluster, loader_delay: Duration) -> Self {
        Self {
            cluster,
            loader_delay,
        }
    }
}

impl ContextProvider for WalletContextProvider {
    fn kind(&self) -> ContextKind {
        ContextKind::Wallet
    }

    fn mount(&self) -> Box<dyn SessionContext> {
        Box::new(WalletSession {
            cluster: self.cluster,
            gate: LoaderGate::start(self.loader_delay),
        })
    }
}

struct DefaultSession {
    gate: LoaderGate,
}

impl SessionContext for DefaultSession {
    fn kind(&self) -> ContextKind {
        ContextKind::Default
    }

    fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }
}

struct WalletSession {
    cluster: SolanaCluster,
    gate: LoaderGate,
}

impl SessionContext for WalletSession {
    fn kind(&self) -> ContextKind {
        ContextKind::Wallet
    }

    fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    fn describe(&self) -> ContextInfo {
        ContextInfo {
            kind: self.kind(),
            ready: self.is_ready(),
            cluster: Some(self.cluster.name().to_owned()),
            usdc_mint: Some(USDC::on(self.cluster).mint.to_string()),
        }
    }
}

/// Owns the mounted context and swaps it as navigation re-classifies.
///
/// Exactly one context is mounted at all times: the default context from
/// construction, then whatever each navigation's classification selects.
/// Navigations within one classification keep the mounted context; a
/// classification change tears the old context down and mounts the new one.
pub struct ProviderSelector {
    classifier: RouteClassifier,
    wallet_provider: Box<dyn ContextProvider>,
    default_provider: Box<dyn ContextProvider>,
    mounted: Option<Box<dyn SessionContext>>,
    path: String,
}

impl ProviderSelector {
    /// Creates a selector and mounts the default context for the empty
    /// initial path.
    #[must_use]
    pub fn new(
        classifier: RouteClassifier,
        wallet_provider: Box<dyn ContextProvider>,
        default_provider: Box<dyn ContextProvider>,
    ) -> Self {
        let mounted = Some(default_provider.mount());
        Self {
            classifier,
            wallet_provider,
            default_provider,
            mounted,
            path: String::new(),
        }
    }

    /// Creates a selector wired to the standard wallet and default
    /// providers.
    #[must_use]
    pub fn standard(
        classifier: RouteClassifier,
        cluster: SolanaCluster,
        loader_delay: Duration,
    ) -> Self {
        Self::new(
            classifier,
            Box::new(WalletContextProvider::new(cluster, loader_delay)),
            Box::new(DefaultContextProvider::new(loader_delay)),
        )
    }

    /// Records a navigation to `path`, swapping the mounted context if its
    /// classification differs from the current one.
    pub fn navigate(&mut self, path: &str) -> &dyn SessionContext {
        let kind = self.classifier.classify(path);
        path.clone_into(&mut self.path);
        if kind != self.kind() {
            tracing::debug!(%path, context = %kind, "swapping session context");
            // Teardown completes before the next mount begins.
            self.mounted = None;
            self.mounted = Some(self.provider_for(kind).mount());
        }
        self.current()
    }

    /// The currently mounted context.
    #[must_use]
    pub fn current(&self) -> &dyn SessionContext {
        self.mounted
            .as_deref()
            .expect("selector always holds a mounted context")
    }

    /// The mounted context's variant.
    #[must_use]
    pub fn kind(&self) -> ContextKind {
        self.current().kind()
    }

    /// The last navigated path, empty before the first navigation.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The classifier driving context selection.
    #[must_use]
    pub fn classifier(&self) -> &RouteClassifier {
        &self.classifier
    }

    fn provider_for(&self, kind: ContextKind) -> &dyn ContextProvider {
        match kind {
            ContextKind::Wallet => self.wallet_provider.as_ref(),
            ContextKind::Default => self.default_provider.as_ref(),
        }
    }
}

impl fmt::Debug for ProviderSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSelector")
            .field("path", &self.path)
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingProvider {
        kind: ContextKind,
        mounts: Arc<AtomicUsize>,
        teardowns: Arc<AtomicUsize>,
    }

    struct CountingSession {
        kind: ContextKind,
        teardowns: Arc<AtomicUsize>,
    }

    impl SessionContext for CountingSession {
        fn kind(&self) -> ContextKind {
            self.kind
        }
    }

    impl Drop for CountingSession {
        fn drop(&mut self) {
            self.teardowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl ContextProvider for CountingProvider {
        fn kind(&self) -> ContextKind {
            self.kind
        }

        fn mount(&self) -> Box<dyn SessionContext> {
            self.mounts.fetch_add(1, Ordering::SeqCst);
            Box::new(CountingSession {
                kind: self.kind,
                teardowns: Arc::clone(&self.teardowns),
            })
        }
    }

    struct Counters {
        mounts: Arc<AtomicUsize>,
        teardowns: Arc<AtomicUsize>,
    }

    impl Counters {
        fn provider(kind: ContextKind) -> (CountingProvider, Self) {
            let mounts = Arc::new(AtomicUsize::new(0));
            let teardowns = Arc::new(AtomicUsize::new(0));
            let provider = CountingProvider {
                kind,
                mounts: Arc::clone(&mounts),
                teardowns: Arc::clone(&teardowns),
            };
            (provider, Self { mounts, teardowns })
        }

        fn mounts(&self) -> usize {
            self.mounts.load(Ordering::SeqCst)
        }

        fn teardowns(&self) -> usize {
            self.teardowns.load(Ordering::SeqCst)
        }
    }

    fn counting_selector() -> (ProviderSelector, Counters, Counters) {
        let (wallet, wallet_counts) = Counters::provider(ContextKind::Wallet);
        let (default, default_counts) = Counters::provider(ContextKind::Default);
        let selector =
            ProviderSelector::new(RouteClassifier::default(), Box::new(wallet), Box::new(default));
        (selector, wallet_counts, default_counts)
    }

    #[test]
    fn test_selector_mounts_default_context_at_construction() {
        let (selector, wallet, default) = counting_selector();
        assert_eq!(selector.kind(), ContextKind::Default);
        assert_eq!(selector.path(), "");
        assert_eq!(default.mounts(), 1);
        assert_eq!(wallet.mounts(), 0);
    }

    #[test]
    fn test_navigation_across_classifications_swaps_exactly_once() {
        let (mut selector, wallet, default) = counting_selector();
        selector.navigate("/about");
        assert_eq!(selector.kind(), ContextKind::Default);

        selector.navigate("/pay/abc");
        assert_eq!(selector.kind(), ContextKind::Wallet);
        assert_eq!(default.teardowns(), 1);
        assert_eq!(wallet.mounts(), 1);
        assert_eq!(default.mounts(), 1);

        selector.navigate("/dashboard");
        assert_eq!(selector.kind(), ContextKind::Default);
        assert_eq!(wallet.teardowns(), 1);
        assert_eq!(default.mounts(), 2);
    }

    #[test]
    fn test_navigation_within_classification_keeps_mounted_context() {
        let (mut selector, wallet, _default) = counting_selector();
        selector.navigate("/pay/abc");
        selector.navigate("/pay/def");
        selector.navigate("/product/xyz");
        assert_eq!(wallet.mounts(), 1);
        assert_eq!(wallet.teardowns(), 0);
        assert_eq!(selector.path(), "/product/xyz");
    }

    #[test]
    fn test_dropping_selector_tears_down_mounted_context() {
        let (selector, _wallet, default) = counting_selector();
        drop(selector);
        assert_eq!(default.teardowns(), 1);
    }

    #[tokio::test]
    async fn test_standard_wallet_context_reports_cluster() {
        let mut selector = ProviderSelector::standard(
            RouteClassifier::default(),
            SolanaCluster::Devnet,
            Duration::from_millis(10),
        );
        let info = selector.navigate("/pay/abc").describe();
        assert_eq!(info.kind, ContextKind::Wallet);
        assert!(!info.ready);
        assert_eq!(info.cluster.as_deref(), Some("devnet"));
        assert_eq!(
            info.usdc_mint.as_deref(),
            Some("4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU")
        );

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(selector.current().is_ready());
    }

    #[tokio::test]
    async fn test_standard_default_context_omits_cluster() {
        let selector = ProviderSelector::standard(
            RouteClassifier::default(),
            SolanaCluster::MainnetBeta,
            Duration::from_millis(10),
        );
        let info = selector.current().describe();
        assert_eq!(info.kind, ContextKind::Default);
        assert_eq!(info.cluster, None);
        assert_eq!(info.usdc_mint, None);

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json.get("cluster"), None);
        assert_eq!(json.get("usdcMint"), None);
    }
}
