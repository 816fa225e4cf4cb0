//! Account screen: the signed-in user's profile and logout.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::client::SlClient;
use crate::error::SlError;
use crate::session::Session;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::UserInfo;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountState {
    pub user_info: Option<UserInfo>,
    pub is_loading: bool,
    pub error: Option<SlError>,
}

pub struct AccountViewModel<T: Transport = ReqwestTransport> {
    client: Arc<SlClient<T>>,
    session: Arc<Session>,
    state: watch::Sender<AccountState>,
    /// Bumped by `logout`; fetches issued before it are dropped.
    epoch: AtomicU64,
}

impl<T: Transport> AccountViewModel<T> {
    pub fn new(client: Arc<SlClient<T>>, session: Arc<Session>) -> Self {
        Self {
            client,
            session,
            state: watch::Sender::new(AccountState::default()),
            epoch: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AccountState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> AccountState {
        self.state.borrow().clone()
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|state| state.error = None);
    }

    /// Fetch the profile. Without `refreshing`, a cached profile or a fetch
    /// already in flight makes this a no-op.
    pub async fn fetch_user_info(&self, refreshing: bool) {
        let mut start = false;
        self.state.send_if_modified(|state| {
            if state.is_loading || (!refreshing && state.user_info.is_some()) {
                return false;
            }
            state.is_loading = true;
            start = true;
            true
        });
        if !start {
            return;
        }
        let epoch = self.epoch.load(Ordering::SeqCst);

        let result = match self.session.credentials() {
            Some(credentials) => self.client.user_info(&credentials).await,
            None => Err(SlError::InvalidApiKey),
        };

        self.state.send_if_modified(|state| {
            if self.epoch.load(Ordering::SeqCst) != epoch {
                debug!("discarding user info fetched before logout");
                return false;
            }
            state.is_loading = false;
            match result {
                Ok(user_info) => state.user_info = Some(user_info),
                Err(error) => state.error = Some(error),
            }
            true
        });
    }

    /// Forget the API key and the cached profile.
    pub fn logout(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.session.sign_out();
        self.state.send_replace(AccountState::default());
        info!("logged out");
    }
}
