//! Checkout sessions and the registry that tracks them.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use verxio::gate::DEFAULT_LOADER_DELAY;
use verxio::networks::SolanaCluster;
use verxio::referral::{ReferralCode, ReferralStore};
use verxio::route::RouteClassifier;
use verxio::session::{ContextInfo, ProviderSelector};
use verxio::storage::{ScopedStorage, SharedStorage};

/// Opaque identifier for one client checkout session.
///
/// Clients may mint their own ids; the server accepts any non-empty value
/// and otherwise generates one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps a client-supplied id, rejecting the empty string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() { None } else { Some(Self(id)) }
    }

    /// Mints a fresh random id: base58 over 16 random bytes.
    #[must_use]
    pub fn generate() -> Self {
        let bytes: [u8; 16] = rand::random();
        Self(bs58::encode(bytes).into_string())
    }

    /// The raw id value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-request snapshot of a session's state.
///
/// Inserted into request extensions by the session middleware; handlers read
/// this instead of reaching into the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveContext {
    /// Session the request is bound to.
    pub session_id: SessionId,
    /// Path the session last navigated to.
    pub path: String,
    /// The mounted context at snapshot time.
    pub context: ContextInfo,
    /// Referral code currently attributed to the session, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral: Option<ReferralCode>,
}

/// One client's checkout state: mounted context plus referral attribution.
#[derive(Debug)]
pub struct CheckoutSession {
    id: SessionId,
    selector: ProviderSelector,
    referral: ReferralStore,
}

impl CheckoutSession {
    /// The session's id.
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// The session's provider selector.
    #[must_use]
    pub fn selector(&self) -> &ProviderSelector {
        &self.selector
    }

    /// The session's referral store.
    #[must_use]
    pub fn referral(&self) -> &ReferralStore {
        &self.referral
    }

    /// Records a navigation: captures any referral code in `query`, lets the
    /// selector re-classify `path`, and returns the resulting snapshot.
    pub fn navigate(&mut self, path: &str, query: Option<&str>) -> ActiveContext {
        if let Some(query) = query {
            self.referral.capture(query);
        }
        self.selector.navigate(path);
        self.snapshot()
    }

    /// Snapshots the session without recording a navigation.
    #[must_use]
    pub fn snapshot(&self) -> ActiveContext {
        ActiveContext {
            session_id: self.id.clone(),
            path: self.selector.path().to_owned(),
            context: self.selector.current().describe(),
            referral: self.referral.get(),
        }
    }
}

/// Configures how fresh checkout sessions are assembled.
///
/// The injected storage backend is shared across sessions; each session
/// writes through a scope prefixed with its id, so a durable backend keeps
/// referral state across process restarts.
#[derive(Clone)]
pub struct SessionBuilder {
    classifier: RouteClassifier,
    storage: SharedStorage,
    cluster: SolanaCluster,
    loader_delay: Duration,
}

impl SessionBuilder {
    /// Creates a builder over `storage` with the default classifier,
    /// mainnet-beta wallet contexts, and the default loader delay.
    pub fn new(storage: SharedStorage) -> Self {
        Self {
            classifier: RouteClassifier::default(),
            storage,
            cluster: SolanaCluster::MainnetBeta,
            loader_delay: DEFAULT_LOADER_DELAY,
        }
    }

    /// Sets the route classifier sessions select contexts with.
    #[must_use]
    pub fn with_classifier(mut self, classifier: RouteClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Sets the cluster wallet contexts connect to.
    #[must_use]
    pub const fn with_cluster(mut self, cluster: SolanaCluster) -> Self {
        self.cluster = cluster;
        self
    }

    /// Sets the loader delay for mounted contexts.
    #[must_use]
    pub const fn with_loader_delay(mut self, delay: Duration) -> Self {
        self.loader_delay = delay;
        self
    }

    /// Assembles a session for `id`, with the default context mounted.
    #[must_use]
    pub fn build(&self, id: SessionId) -> CheckoutSession {
        let storage = ScopedStorage::new(id.as_str(), Arc::clone(&self.storage));
        let selector =
            ProviderSelector::standard(self.classifier.clone(), self.cluster, self.loader_delay);
        CheckoutSession {
            id,
            selector,
            referral: ReferralStore::new(Arc::new(storage)),
        }
    }
}

impl fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("classifier", &self.classifier)
            .field("cluster", &self.cluster)
            .field("loader_delay", &self.loader_delay)
            .field("storage", &"<StorageBackend>")
            .finish()
    }
}

/// Shared handle to one session's mutable state.
pub type SharedSession = Arc<Mutex<CheckoutSession>>;

/// Live checkout sessions, keyed by id.
///
/// Sessions are created on first sight of an id and live for the rest of the
/// process. A client presenting a known id after a restart gets a fresh
/// session over the same storage scope, so durable referral state carries
/// over.
pub struct SessionRegistry {
    builder: SessionBuilder,
    sessions: DashMap<SessionId, SharedSession>,
}

impl SessionRegistry {
    /// Creates an empty registry that assembles sessions with `builder`.
    #[must_use]
    pub fn new(builder: SessionBuilder) -> Self {
        Self {
            builder,
            sessions: DashMap::new(),
        }
    }

    /// Returns the session for `id`, creating it if unknown. Mints a fresh
    /// id when none is supplied.
    pub fn resolve(&self, id: Option<SessionId>) -> (SessionId, SharedSession) {
        let id = id.unwrap_or_else(SessionId::generate);
        let session = Arc::clone(
            self.sessions
                .entry(id.clone())
                .or_insert_with(|| {
                    tracing::debug!(session = %id, "creating checkout session");
                    Arc::new(Mutex::new(self.builder.build(id.clone())))
                })
                .value(),
        );
        (id, session)
    }

    /// Looks up an existing session.
    #[must_use]
    pub fn get(&self, id: &SessionId) -> Option<SharedSession> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Drops the session for `id`; its mounted context tears down with it.
    /// Returns whether the session existed.
    pub fn remove(&self, id: &SessionId) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("builder", &self.builder)
            .field("sessions", &self.sessions.len())
            .finish()
    }
}
