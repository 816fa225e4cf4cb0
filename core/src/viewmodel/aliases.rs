//! Aliases screen: paginated list, search, status filter and per-alias
//! mutations.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::debug;

use crate::client::SlClient;
use crate::config::ClientConfig;
use crate::session::Session;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{Alias, AliasId, AliasMailbox, MailboxId, RandomMode};

use super::list::{remove_where, update_where, ListHandle, ListSnapshot, PagedList};
use super::lock;

/// Local filter over the loaded aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AliasStatus {
    #[default]
    All,
    Active,
    Inactive,
}

impl AliasStatus {
    pub fn matches(self, alias: &Alias) -> bool {
        match self {
            AliasStatus::All => true,
            AliasStatus::Active => alias.enabled,
            AliasStatus::Inactive => !alias.enabled,
        }
    }
}

pub struct AliasesViewModel<T: Transport = ReqwestTransport> {
    client: Arc<SlClient<T>>,
    session: Arc<Session>,
    aliases: ListHandle<Alias>,
    search_term: Mutex<Option<String>>,
    status: Mutex<AliasStatus>,
}

impl<T: Transport> AliasesViewModel<T> {
    pub fn new(client: Arc<SlClient<T>>, session: Arc<Session>, config: &ClientConfig) -> Self {
        Self {
            client,
            session,
            aliases: ListHandle::new(
                PagedList::paginated(config.page_size),
                config.prefetch_distance,
            ),
            search_term: Mutex::new(None),
            status: Mutex::new(AliasStatus::All),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot<Alias>> {
        self.aliases.subscribe()
    }

    pub fn snapshot(&self) -> ListSnapshot<Alias> {
        self.aliases.snapshot()
    }

    pub fn status(&self) -> AliasStatus {
        *lock(&self.status)
    }

    pub fn set_status(&self, status: AliasStatus) {
        *lock(&self.status) = status;
    }

    /// Loaded aliases that pass the current status filter.
    pub fn filtered_aliases(&self) -> Vec<Alias> {
        let status = self.status();
        self.snapshot()
            .items
            .into_iter()
            .filter(|alias| status.matches(alias))
            .collect()
    }

    pub fn search_term(&self) -> Option<String> {
        lock(&self.search_term).clone()
    }

    pub fn clear_error(&self) {
        self.aliases.clear_error();
    }

    pub async fn fetch_more(&self) {
        let client = &self.client;
        let term = self.search_term();
        self.aliases
            .fetch_more(&self.session, |credentials, page| async move {
                client.aliases(&credentials, page, term.as_deref()).await
            })
            .await;
    }

    /// Called as the screen renders `current`; `None` on first appearance.
    pub async fn fetch_more_if_needed(&self, current: Option<AliasId>) {
        let client = &self.client;
        let term = self.search_term();
        self.aliases
            .fetch_more_if_needed(current.as_ref(), &self.session, |credentials, page| async move {
                client.aliases(&credentials, page, term.as_deref()).await
            })
            .await;
    }

    pub async fn refresh(&self) {
        let client = &self.client;
        let term = self.search_term();
        self.aliases
            .refresh(&self.session, |credentials, page| async move {
                client.aliases(&credentials, page, term.as_deref()).await
            })
            .await;
    }

    /// Switch to a new search (or back to the plain list with `None`) and
    /// reload from the first page.
    pub async fn search(&self, term: Option<String>) {
        debug!(searching = term.is_some(), "alias search changed");
        *lock(&self.search_term) = term;
        self.refresh().await;
    }

    pub async fn toggle(&self, alias_id: AliasId) {
        let client = &self.client;
        self.aliases
            .mutate(
                &self.session,
                move |credentials| async move { client.toggle_alias(&credentials, alias_id).await },
                |items, enabled| update_where(items, &alias_id, |alias| alias.enabled = enabled),
            )
            .await;
    }

    pub async fn delete(&self, alias_id: AliasId) {
        let client = &self.client;
        self.aliases
            .mutate(
                &self.session,
                move |credentials| async move { client.delete_alias(&credentials, alias_id).await },
                |items, ()| remove_where(items, &alias_id),
            )
            .await;
    }

    pub async fn update_name(&self, alias_id: AliasId, name: Option<String>) {
        let client = &self.client;
        let sent = name.clone();
        self.aliases
            .mutate(
                &self.session,
                move |credentials| async move {
                    client.update_alias_name(&credentials, alias_id, sent).await
                },
                |items, ()| update_where(items, &alias_id, |alias| alias.name = name),
            )
            .await;
    }

    pub async fn update_note(&self, alias_id: AliasId, note: Option<String>) {
        let client = &self.client;
        let sent = note.clone();
        self.aliases
            .mutate(
                &self.session,
                move |credentials| async move {
                    client.update_alias_note(&credentials, alias_id, sent).await
                },
                |items, ()| update_where(items, &alias_id, |alias| alias.note = note),
            )
            .await;
    }

    pub async fn update_mailboxes(&self, alias_id: AliasId, mailboxes: Vec<AliasMailbox>) {
        let client = &self.client;
        let ids: Vec<MailboxId> = mailboxes.iter().map(|mailbox| mailbox.id).collect();
        self.aliases
            .mutate(
                &self.session,
                move |credentials| async move {
                    client.update_alias_mailboxes(&credentials, alias_id, ids).await
                },
                |items, ()| update_where(items, &alias_id, |alias| alias.mailboxes = mailboxes),
            )
            .await;
    }

    /// Create a random alias and show it first.
    pub async fn random(&self, mode: RandomMode, note: Option<String>) {
        let client = &self.client;
        self.aliases
            .mutate(
                &self.session,
                move |credentials| async move { client.random_alias(&credentials, mode, note).await },
                |items, alias: Alias| {
                    remove_where(items, &alias.id);
                    items.insert(0, alias);
                },
            )
            .await;
    }
}
