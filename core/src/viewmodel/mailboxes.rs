//! Mailboxes screen. The server returns every mailbox in one response.

use std::sync::Arc;

use tokio::sync::watch;

use crate::client::SlClient;
use crate::config::ClientConfig;
use crate::session::{Credentials, Session};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{Mailbox, MailboxId};

use super::list::{remove_where, ListHandle, ListSnapshot, PagedList};

pub struct MailboxesViewModel<T: Transport = ReqwestTransport> {
    client: Arc<SlClient<T>>,
    session: Arc<Session>,
    mailboxes: ListHandle<Mailbox>,
}

impl<T: Transport> MailboxesViewModel<T> {
    pub fn new(client: Arc<SlClient<T>>, session: Arc<Session>, config: &ClientConfig) -> Self {
        Self {
            client,
            session,
            mailboxes: ListHandle::new(PagedList::single_page(), config.prefetch_distance),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot<Mailbox>> {
        self.mailboxes.subscribe()
    }

    pub fn snapshot(&self) -> ListSnapshot<Mailbox> {
        self.mailboxes.snapshot()
    }

    pub fn clear_error(&self) {
        self.mailboxes.clear_error();
    }

    /// Load mailboxes. Without `refreshing`, a loaded list or a load already
    /// in flight makes this a no-op.
    pub async fn fetch(&self, refreshing: bool) {
        let client = &self.client;
        let fetch = |credentials: Credentials, _: u32| async move {
            client.mailboxes(&credentials).await
        };
        if refreshing {
            self.mailboxes.refresh(&self.session, fetch).await;
        } else {
            self.mailboxes.load(&self.session, fetch).await;
        }
    }

    pub async fn refresh(&self) {
        self.fetch(true).await;
    }

    /// Make `mailbox_id` the default. The previous default changes too, so
    /// the whole list is reloaded on success.
    pub async fn make_default(&self, mailbox_id: MailboxId) {
        let client = &self.client;
        let updated = self
            .mailboxes
            .mutate(
                &self.session,
                move |credentials| async move {
                    client.make_default_mailbox(&credentials, mailbox_id).await
                },
                |_, _| {},
            )
            .await;
        if updated {
            self.fetch(true).await;
        }
    }

    pub async fn delete(&self, mailbox_id: MailboxId) {
        let client = &self.client;
        self.mailboxes
            .mutate(
                &self.session,
                move |credentials| async move {
                    client.delete_mailbox(&credentials, mailbox_id).await
                },
                |items, ()| remove_where(items, &mailbox_id),
            )
            .await;
    }

    pub async fn add(&self, email: &str) {
        let client = &self.client;
        self.mailboxes
            .mutate(
                &self.session,
                move |credentials| async move { client.create_mailbox(&credentials, email).await },
                |items, mailbox| items.push(mailbox),
            )
            .await;
    }
}
