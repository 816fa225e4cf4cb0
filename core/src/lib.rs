//! Client core for the SimpleLogin email alias service.
//!
//! # Overview
//! Three layers, bottom-up:
//! - [`endpoint`] turns a typed [`Endpoint`] into an [`HttpRequest`] without
//!   touching the network; [`client::parse_response`] maps an
//!   [`HttpResponse`] to a typed value or an [`SlError`].
//! - [`SlClient`] runs requests through a [`Transport`] (reqwest by default)
//!   and exposes one async method per server operation.
//! - [`viewmodel`] holds per-screen state: paginated lists, loading and
//!   error flags, and single-item mutations applied after the server
//!   confirms them.
//!
//! # Design
//! - [`Session`] owns the base URL and API key. Each request takes a
//!   [`Credentials`] snapshot, so a logout mid-flight never affects a
//!   request already issued.
//! - Every list request carries a [`PageTicket`]; a refresh starts a new
//!   generation and late completions from the old one are dropped.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod session;
pub mod transport;
pub mod types;
pub mod viewmodel;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::SlClient;
pub use config::{ClientConfig, ConfigError};
pub use endpoint::{Endpoint, EndpointKind};
pub use error::SlError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use session::{ApiKey, Credentials, Session};
pub use transport::{ReqwestTransport, Transport, TransportError};
pub use types::{
    ActivityAction, Alias, AliasActivity, AliasId, AliasMailbox, Contact, ContactId, Mailbox,
    MailboxId, RandomMode, UserInfo, UserLogin,
};
pub use viewmodel::{
    AccountState, AccountViewModel, AliasDetailViewModel, AliasStatus, AliasesViewModel,
    AuthState, AuthViewModel, ListSnapshot, MailboxesViewModel, MfaChallenge, PageTicket, Phase,
};
