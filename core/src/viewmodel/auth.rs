//! Sign-in, two-factor verification and registration.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::client::SlClient;
use crate::config::ClientConfig;
use crate::error::SlError;
use crate::session::{ApiKey, Session};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::UserLogin;

/// Pending second factor after a password login on an MFA account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MfaChallenge {
    pub mfa_key: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub is_loading: bool,
    pub error: Option<SlError>,
    pub mfa: Option<MfaChallenge>,
    /// Set after a successful registration until the UI acknowledges it.
    pub registered_email: Option<String>,
}

pub struct AuthViewModel<T: Transport = ReqwestTransport> {
    client: Arc<SlClient<T>>,
    session: Arc<Session>,
    device_name: String,
    state: watch::Sender<AuthState>,
}

impl<T: Transport> AuthViewModel<T> {
    pub fn new(client: Arc<SlClient<T>>, session: Arc<Session>, config: &ClientConfig) -> Self {
        Self {
            client,
            session,
            device_name: config.device_name.clone(),
            state: watch::Sender::new(AuthState::default()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|state| state.error = None);
    }

    pub fn handled_registered_email(&self) {
        self.state.send_modify(|state| state.registered_email = None);
    }

    pub fn cancel_mfa(&self) {
        self.state.send_modify(|state| state.mfa = None);
    }

    /// Returns true once the session holds an API key.
    pub async fn login(&self, email: &str, password: &str) -> bool {
        if !self.begin() {
            return false;
        }
        let base_url = self.session.base_url();
        let result = self
            .client
            .login(&base_url, email, password, &self.device_name)
            .await;
        self.finish_login(result)
    }

    /// Answer the pending MFA challenge with a one-time `token`.
    pub async fn verify_mfa(&self, token: &str) -> bool {
        let pending = self.state.borrow().mfa.clone();
        let Some(challenge) = pending else {
            return false;
        };
        if !self.begin() {
            return false;
        }
        let base_url = self.session.base_url();
        let result = self
            .client
            .mfa(&base_url, token, &challenge.mfa_key, &self.device_name)
            .await;
        self.finish_login(result)
    }

    pub async fn register(&self, email: &str, password: &str) -> bool {
        if !self.begin() {
            return false;
        }
        let base_url = self.session.base_url();
        let result = self.client.register(&base_url, email, password).await;
        let registered = result.is_ok();
        self.state.send_modify(|state| {
            state.is_loading = false;
            match result {
                Ok(_) => state.registered_email = Some(email.to_string()),
                Err(error) => state.error = Some(error),
            }
        });
        registered
    }

    /// Flag the start of a request; false if one is already running. A
    /// published error stays until `clear_error`.
    fn begin(&self) -> bool {
        self.state.send_if_modified(|state| {
            if state.is_loading {
                return false;
            }
            state.is_loading = true;
            true
        })
    }

    fn finish_login(&self, result: Result<UserLogin, SlError>) -> bool {
        let mut signed_in = false;
        self.state.send_modify(|state| {
            state.is_loading = false;
            match result {
                Ok(UserLogin {
                    api_key: Some(api_key),
                    email,
                    ..
                }) => {
                    self.session.sign_in(ApiKey::new(api_key));
                    state.mfa = None;
                    signed_in = true;
                    info!(%email, "signed in");
                }
                Ok(UserLogin {
                    mfa_enabled: true,
                    mfa_key: Some(mfa_key),
                    email,
                    ..
                }) => {
                    info!(%email, "mfa required");
                    state.mfa = Some(MfaChallenge { mfa_key, email });
                }
                Ok(_) => {
                    state.error = Some(SlError::FailToParseObject("UserLogin".to_string()));
                }
                Err(error) => state.error = Some(error),
            }
        });
        signed_in
    }
}
