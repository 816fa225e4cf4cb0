//! Authenticated context shared by every view-model.
//!
//! `Session` is the single mutable holder of base URL and API key. Calls
//! never read it mid-flight: they take a `Credentials` snapshot when they
//! are issued and build their request from that.

use std::fmt;
use std::sync::{PoisonError, RwLock};

use tracing::info;
use url::Url;

/// Opaque API credential. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Immutable snapshot of {base URL, API key}, carried by every
/// authenticated endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub base_url: Url,
    pub api_key: ApiKey,
}

impl Credentials {
    pub fn new(base_url: Url, api_key: ApiKey) -> Self {
        Self { base_url, api_key }
    }
}

#[derive(Debug)]
struct SessionState {
    base_url: Url,
    api_key: Option<ApiKey>,
}

/// Shared holder of the signed-in state. Wrap in `Arc` and hand a clone to
/// each view-model.
#[derive(Debug)]
pub struct Session {
    state: RwLock<SessionState>,
}

impl Session {
    /// A signed-out session pointing at `base_url`.
    pub fn new(base_url: Url) -> Self {
        Self {
            state: RwLock::new(SessionState {
                base_url,
                api_key: None,
            }),
        }
    }

    pub fn with_api_key(base_url: Url, api_key: ApiKey) -> Self {
        Self {
            state: RwLock::new(SessionState {
                base_url,
                api_key: Some(api_key),
            }),
        }
    }

    pub fn base_url(&self) -> Url {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .base_url
            .clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .api_key
            .is_some()
    }

    /// Snapshot for one call, or `None` when signed out.
    pub fn credentials(&self) -> Option<Credentials> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .api_key
            .as_ref()
            .map(|key| Credentials::new(state.base_url.clone(), key.clone()))
    }

    pub fn sign_in(&self, api_key: ApiKey) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .api_key = Some(api_key);
        info!("session signed in");
    }

    pub fn sign_out(&self) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .api_key = None;
        info!("session signed out");
    }

    /// Point the session at another server (self-hosted instances).
    pub fn set_base_url(&self, base_url: Url) {
        info!(%base_url, "session base url changed");
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .base_url = base_url;
    }
}
