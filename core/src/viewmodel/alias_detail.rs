//! Detail screen of one alias: its activity log and its contacts, each
//! paginated independently.

use std::sync::Arc;

use tokio::sync::watch;

use crate::client::SlClient;
use crate::config::ClientConfig;
use crate::session::Session;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{AliasActivity, AliasId, Contact, ContactId, Record};

use super::list::{remove_where, ListHandle, ListSnapshot, PagedList};

pub struct AliasDetailViewModel<T: Transport = ReqwestTransport> {
    client: Arc<SlClient<T>>,
    session: Arc<Session>,
    alias_id: AliasId,
    activities: ListHandle<AliasActivity>,
    contacts: ListHandle<Contact>,
}

impl<T: Transport> AliasDetailViewModel<T> {
    pub fn new(
        client: Arc<SlClient<T>>,
        session: Arc<Session>,
        alias_id: AliasId,
        config: &ClientConfig,
    ) -> Self {
        Self {
            client,
            session,
            alias_id,
            activities: ListHandle::new(
                PagedList::paginated(config.page_size),
                config.prefetch_distance,
            ),
            contacts: ListHandle::new(
                PagedList::paginated(config.page_size),
                config.prefetch_distance,
            ),
        }
    }

    pub fn alias_id(&self) -> AliasId {
        self.alias_id
    }

    pub fn subscribe_activities(&self) -> watch::Receiver<ListSnapshot<AliasActivity>> {
        self.activities.subscribe()
    }

    pub fn subscribe_contacts(&self) -> watch::Receiver<ListSnapshot<Contact>> {
        self.contacts.subscribe()
    }

    pub fn activities(&self) -> ListSnapshot<AliasActivity> {
        self.activities.snapshot()
    }

    pub fn contacts(&self) -> ListSnapshot<Contact> {
        self.contacts.snapshot()
    }

    pub fn clear_errors(&self) {
        self.activities.clear_error();
        self.contacts.clear_error();
    }

    pub async fn fetch_more_activities(&self) {
        let (client, alias_id) = (&self.client, self.alias_id);
        self.activities
            .fetch_more(&self.session, |credentials, page| async move {
                client.alias_activities(&credentials, alias_id, page).await
            })
            .await;
    }

    pub async fn fetch_more_activities_if_needed(&self, current: Option<&AliasActivity>) {
        let (client, alias_id) = (&self.client, self.alias_id);
        let key = current.map(|activity| activity.key());
        self.activities
            .fetch_more_if_needed(key.as_ref(), &self.session, |credentials, page| {
                async move { client.alias_activities(&credentials, alias_id, page).await }
            })
            .await;
    }

    pub async fn refresh_activities(&self) {
        let (client, alias_id) = (&self.client, self.alias_id);
        self.activities
            .refresh(&self.session, |credentials, page| async move {
                client.alias_activities(&credentials, alias_id, page).await
            })
            .await;
    }

    pub async fn fetch_more_contacts(&self) {
        let (client, alias_id) = (&self.client, self.alias_id);
        self.contacts
            .fetch_more(&self.session, |credentials, page| async move {
                client.contacts(&credentials, alias_id, page).await
            })
            .await;
    }

    pub async fn fetch_more_contacts_if_needed(&self, current: Option<ContactId>) {
        let (client, alias_id) = (&self.client, self.alias_id);
        self.contacts
            .fetch_more_if_needed(current.as_ref(), &self.session, |credentials, page| {
                async move { client.contacts(&credentials, alias_id, page).await }
            })
            .await;
    }

    pub async fn refresh_contacts(&self) {
        let (client, alias_id) = (&self.client, self.alias_id);
        self.contacts
            .refresh(&self.session, |credentials, page| async move {
                client.contacts(&credentials, alias_id, page).await
            })
            .await;
    }

    /// Create a contact (reverse alias) and show it first.
    pub async fn create_contact(&self, email: &str) {
        let (client, alias_id) = (&self.client, self.alias_id);
        self.contacts
            .mutate(
                &self.session,
                move |credentials| async move {
                    client.create_contact(&credentials, alias_id, email).await
                },
                |items, contact: Contact| {
                    remove_where(items, &contact.id);
                    items.insert(0, contact);
                },
            )
            .await;
    }
}
