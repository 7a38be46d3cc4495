//! Route classification for checkout page paths.
//!
//! Every navigation path maps to exactly one [`ContextKind`], which decides
//! whether the page subtree runs under the wallet-enabled session context or
//! the general-purpose one. Classification is a pure function of the path so
//! it can be tested without any mounting machinery.
//!
//! The set of path prefixes that select the wallet context is configuration,
//! not a hard-coded rule: merchants add flow families over time, and the
//! gateway config (`session.wallet_prefixes`) can extend or replace
//! [`DEFAULT_WALLET_PREFIXES`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// The session-context variant a page subtree runs under.
///
/// Exactly one kind is active for any mounted subtree; see
/// [`ProviderSelector`](crate::session::ProviderSelector).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextKind {
    /// Wallet-enabled session context, mounted for payment- and
    /// product-related paths.
    Wallet,
    /// General-purpose session context, mounted everywhere else.
    Default,
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wallet => write!(f, "wallet"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// The merchant flow families Verxio Checkout serves.
///
/// Each family owns a URL prefix under which its pages live. Only the
/// payment and product families require wallet connectivity by default;
/// loyalty and task pages render under the default context unless the
/// deployment configures otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowKind {
    /// Direct payment flows (`/pay/...`).
    Payment,
    /// Product checkout flows (`/product/...`).
    Product,
    /// Loyalty program flows (`/loyalty/...`).
    Loyalty,
    /// Task reward flows (`/task/...`).
    Task,
}

impl FlowKind {
    /// All flow families, in routing-priority order.
    pub const ALL: &[Self] = &[Self::Payment, Self::Product, Self::Loyalty, Self::Task];

    /// The URL prefix under which this flow family's pages live.
    #[must_use]
    pub const fn path_prefix(&self) -> &'static str {
        match self {
            Self::Payment => "/pay",
            Self::Product => "/product",
            Self::Loyalty => "/loyalty",
            Self::Task => "/task",
        }
    }

    /// Resolves the flow family a path belongs to, if any.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .find(|kind| path.starts_with(kind.path_prefix()))
            .copied()
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Payment => write!(f, "payment"),
            Self::Product => write!(f, "product"),
            Self::Loyalty => write!(f, "loyalty"),
            Self::Task => write!(f, "task"),
        }
    }
}

/// Path prefixes that select the wallet context when no override is
/// configured: the payment and product flow families.
pub const DEFAULT_WALLET_PREFIXES: &[&str] = &[
    FlowKind::Payment.path_prefix(),
    FlowKind::Product.path_prefix(),
];

/// Classifies navigation paths into session-context kinds.
///
/// Classification is total and deterministic: every path (including the
/// empty one, seen before the router has resolved) maps to exactly one
/// [`ContextKind`]. Matching is a plain prefix test, so `/payments/x`
/// classifies the same as `/pay/x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteClassifier {
    wallet_prefixes: Vec<String>,
}

impl RouteClassifier {
    /// Creates a classifier from a set of wallet-context prefixes.
    ///
    /// Empty prefixes are discarded: an empty prefix would match every
    /// path and silently disable the default context.
    pub fn new<I, S>(wallet_prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            wallet_prefixes: wallet_prefixes
                .into_iter()
                .map(Into::into)
                .filter(|prefix| !prefix.is_empty())
                .collect(),
        }
    }

    /// The configured wallet-context prefixes.
    #[must_use]
    pub fn wallet_prefixes(&self) -> &[String] {
        &self.wallet_prefixes
    }

    /// Maps a navigation path to its session-context kind.
    ///
    /// An empty path classifies as [`ContextKind::Default`].
    #[must_use]
    pub fn classify(&self, path: &str) -> ContextKind {
        if path.is_empty() {
            return ContextKind::Default;
        }
        if self
            .wallet_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
        {
            ContextKind::Wallet
        } else {
            ContextKind::Default
        }
    }
}

impl Default for RouteClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_WALLET_PREFIXES.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_wallet_prefixes() {
        let classifier = RouteClassifier::default();
        assert_eq!(classifier.classify("/pay"), ContextKind::Wallet);
        assert_eq!(classifier.classify("/pay/abc123"), ContextKind::Wallet);
        assert_eq!(classifier.classify("/product/sku-1"), ContextKind::Wallet);
    }

    #[test]
    fn test_classify_default_paths() {
        let classifier = RouteClassifier::default();
        assert_eq!(classifier.classify("/"), ContextKind::Default);
        assert_eq!(classifier.classify("/about"), ContextKind::Default);
        assert_eq!(classifier.classify("/loyalty/card-9"), ContextKind::Default);
        assert_eq!(classifier.classify("/task/42"), ContextKind::Default);
    }

    #[test]
    fn test_classify_empty_path_is_default() {
        let classifier = RouteClassifier::default();
        assert_eq!(classifier.classify(""), ContextKind::Default);
    }

    #[test]
    fn test_classify_is_prefix_based() {
        // Plain prefix matching: sibling paths sharing the prefix text
        // classify as wallet too.
        let classifier = RouteClassifier::default();
        assert_eq!(classifier.classify("/payments"), ContextKind::Wallet);
        assert_eq!(classifier.classify("/products/9"), ContextKind::Wallet);
    }

    #[test]
    fn test_classify_custom_prefixes() {
        let classifier = RouteClassifier::new(["/checkout", "/loyalty"]);
        assert_eq!(classifier.classify("/checkout/1"), ContextKind::Wallet);
        assert_eq!(classifier.classify("/loyalty/1"), ContextKind::Wallet);
        assert_eq!(classifier.classify("/pay/1"), ContextKind::Default);
    }

    #[test]
    fn test_empty_prefix_is_discarded() {
        let classifier = RouteClassifier::new(["", "/pay"]);
        assert_eq!(classifier.wallet_prefixes(), &["/pay".to_owned()]);
        assert_eq!(classifier.classify("/about"), ContextKind::Default);
    }

    #[test]
    fn test_flow_kind_from_path() {
        assert_eq!(FlowKind::from_path("/pay/x"), Some(FlowKind::Payment));
        assert_eq!(FlowKind::from_path("/product/x"), Some(FlowKind::Product));
        assert_eq!(FlowKind::from_path("/loyalty/x"), Some(FlowKind::Loyalty));
        assert_eq!(FlowKind::from_path("/task/x"), Some(FlowKind::Task));
        assert_eq!(FlowKind::from_path("/about"), None);
    }

    #[test]
    fn test_context_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ContextKind::Wallet).unwrap(),
            "\"wallet\""
        );
        assert_eq!(
            serde_json::to_string(&ContextKind::Default).unwrap(),
            "\"default\""
        );
    }
}
