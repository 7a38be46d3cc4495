//! Referral capture and attribution.
//!
//! A referral code arrives as a `ref` query parameter on any page URL. The
//! [`ReferralStore`] persists it under one well-known key in the session's
//! [`StorageBackend`] so checkout actions can recover it later, across
//! navigations and reloads. At most one code is stored at a time; a newly
//! observed code replaces the previous one.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::storage::{SharedStorage, StorageBackend};

/// Query parameter a referral code arrives under.
pub const REFERRAL_QUERY_PARAM: &str = "ref";

/// Storage key the current referral code is persisted under.
///
/// Fixed and distinct from any other persisted client state so unrelated
/// writes never collide with attribution.
pub const REFERRAL_STORAGE_KEY: &str = "verxio_referral_code";

/// An opaque attribution token captured from a page URL.
///
/// The value is never interpreted by the checkout core; it is stored on
/// capture and handed back verbatim at attribution time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferralCode(String);

impl ReferralCode {
    /// Wraps a raw code, rejecting the empty string.
    ///
    /// An empty parameter value means "no referral", never an empty code.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Option<Self> {
        let code = code.into();
        if code.is_empty() { None } else { Some(Self(code)) }
    }

    /// The raw code value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the token, returning the raw code value.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for ReferralCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferralCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persists the session's referral code in an injected storage backend.
///
/// Every operation degrades rather than fails: with a backend that cannot
/// store (see [`NullStorage`](crate::storage::NullStorage)) captures are
/// dropped and reads return absent.
#[derive(Clone)]
pub struct ReferralStore {
    storage: SharedStorage,
}

impl ReferralStore {
    /// Creates a store backed by `storage`.
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    /// Creates a store backed by a concrete backend.
    pub fn with_backend<S: StorageBackend + 'static>(backend: S) -> Self {
        Self::new(Arc::new(backend))
    }

    /// Captures a referral code from a navigation URL's query string.
    ///
    /// Reads the first `ref` parameter (a leading `?` is tolerated). A
    /// missing or empty parameter is a no-op. A present code is persisted
    /// under [`REFERRAL_STORAGE_KEY`], replacing any previous code; writing
    /// an unchanged value is skipped. Returns the code now captured, if any.
    pub fn capture(&self, query: &str) -> Option<ReferralCode> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let raw = url::form_urlencoded::parse(query.as_bytes())
            .find(|(name, _)| name == REFERRAL_QUERY_PARAM)
            .map(|(_, value)| value.into_owned())?;
        let code = ReferralCode::new(raw)?;
        let previous = self.storage.get(REFERRAL_STORAGE_KEY);
        if previous.as_deref() != Some(code.as_str()) {
            self.storage.set(REFERRAL_STORAGE_KEY, code.as_str());
            tracing::debug!(code = %code, "captured referral code");
        }
        Some(code)
    }

    /// Reads the current referral code from the durable store.
    ///
    /// Returns `None` when no code has been captured or the backend cannot
    /// serve reads.
    #[must_use]
    pub fn get(&self) -> Option<ReferralCode> {
        self.storage.get(REFERRAL_STORAGE_KEY).and_then(ReferralCode::new)
    }

    /// Removes the stored referral code, if any.
    pub fn clear(&self) {
        self.storage.remove(REFERRAL_STORAGE_KEY);
        tracing::debug!("cleared referral code");
    }
}

impl fmt::Debug for ReferralStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferralStore")
            .field("storage", &"<StorageBackend>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, NullStorage};

    fn store() -> ReferralStore {
        ReferralStore::with_backend(MemoryStorage::new())
    }

    #[test]
    fn test_capture_then_get_returns_code() {
        let store = store();
        assert_eq!(store.get(), None);
        store.capture("ref=abc123");
        assert_eq!(store.get(), ReferralCode::new("abc123"));
    }

    #[test]
    fn test_recapture_overwrites_previous_code() {
        let store = store();
        store.capture("ref=abc123");
        store.capture("ref=xyz789");
        assert_eq!(store.get(), ReferralCode::new("xyz789"));
    }

    #[test]
    fn test_clear_resets_to_absent() {
        let store = store();
        store.capture("ref=abc123");
        store.clear();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn test_capture_without_backend_degrades_to_absent() {
        let store = ReferralStore::with_backend(NullStorage);
        assert_eq!(store.capture("ref=abc123"), ReferralCode::new("abc123"));
        assert_eq!(store.get(), None);
        store.clear();
    }

    #[test]
    fn test_missing_or_empty_param_is_ignored() {
        let store = store();
        store.capture("");
        store.capture("utm_source=x&utm_medium=y");
        store.capture("ref=");
        assert_eq!(store.get(), None);

        store.capture("ref=kept");
        store.capture("ref=");
        assert_eq!(store.get(), ReferralCode::new("kept"));
    }

    #[test]
    fn test_first_param_occurrence_wins() {
        let store = store();
        assert_eq!(store.capture("ref=first&ref=second"), ReferralCode::new("first"));
        assert_eq!(store.get(), ReferralCode::new("first"));

        assert_eq!(store.capture("ref=&ref=second"), None);
        assert_eq!(store.get(), ReferralCode::new("first"));
    }

    #[test]
    fn test_query_may_carry_leading_question_mark() {
        let store = store();
        store.capture("?ref=abc123&page=2");
        assert_eq!(store.get(), ReferralCode::new("abc123"));
    }

    #[test]
    fn test_percent_encoded_codes_are_decoded() {
        let store = store();
        store.capture("ref=spring%2D25");
        assert_eq!(store.get(), ReferralCode::new("spring-25"));
    }

    #[test]
    fn test_code_is_stored_under_well_known_key() {
        let backend: SharedStorage = Arc::new(MemoryStorage::new());
        let store = ReferralStore::new(Arc::clone(&backend));
        store.capture("ref=abc123");
        assert_eq!(backend.get(REFERRAL_STORAGE_KEY), Some("abc123".to_owned()));
    }
}
