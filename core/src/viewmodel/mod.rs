//! Per-screen controllers.
//!
//! Each view-model owns its records and its error/loading state, publishes
//! snapshots through a `tokio::sync::watch` channel and exposes async
//! operations for the UI to call. View-models never share collections, so a
//! failure on one screen stays on that screen.

pub mod account;
pub mod alias_detail;
pub mod aliases;
pub mod auth;
pub mod list;
pub mod mailboxes;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use account::{AccountState, AccountViewModel};
pub use alias_detail::AliasDetailViewModel;
pub use aliases::{AliasStatus, AliasesViewModel};
pub use auth::{AuthState, AuthViewModel, MfaChallenge};
pub use list::{FetchMode, ListHandle, ListSnapshot, PageTicket, PagedList, Phase};
pub use mailboxes::MailboxesViewModel;

/// Lock, recovering from poison. Critical sections never leave state half
/// written.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
