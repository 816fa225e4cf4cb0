//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts its own mock server on a random port, so stores never
//! leak between tests. Requests go through `ReqwestTransport`, which checks
//! that the core's request building and response parsing agree with a real
//! HTTP server.

use std::sync::Arc;

use simplelogin_core::{
    AccountViewModel, AliasDetailViewModel, AliasStatus, AliasesViewModel, ApiKey,
    AuthViewModel, ClientConfig, MailboxesViewModel, RandomMode, Session, SlClient, SlError,
};
use url::Url;

struct Harness {
    client: Arc<SlClient>,
    session: Arc<Session>,
    config: ClientConfig,
}

async fn start() -> Harness {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener));

    let config = ClientConfig {
        base_url: Url::parse(&format!("http://{addr}")).unwrap(),
        ..ClientConfig::default()
    };
    let client = Arc::new(SlClient::from_config(&config).unwrap());
    let session = Arc::new(Session::new(config.base_url.clone()));
    Harness {
        client,
        session,
        config,
    }
}

impl Harness {
    fn sign_in(&self) {
        self.session.sign_in(ApiKey::new(mock_server::API_KEY));
    }
}

#[tokio::test]
async fn login_then_logout() {
    let h = start().await;
    let auth = AuthViewModel::new(Arc::clone(&h.client), Arc::clone(&h.session), &h.config);

    assert!(!auth.login(mock_server::EMAIL, "wrong").await);
    assert_eq!(auth.state().error, Some(SlError::EmailOrPasswordIncorrect));

    assert!(!auth.login(mock_server::INACTIVE_EMAIL, mock_server::PASSWORD).await);
    assert_eq!(auth.state().error, Some(SlError::ReactivationNeeded));

    assert!(auth.login(mock_server::EMAIL, mock_server::PASSWORD).await);
    assert!(h.session.is_signed_in());

    let account = AccountViewModel::new(Arc::clone(&h.client), Arc::clone(&h.session));
    account.fetch_user_info(false).await;
    let user = account.state().user_info.unwrap();
    assert_eq!(user.email, mock_server::EMAIL);
    assert!(user.is_premium);

    account.logout();
    assert!(!h.session.is_signed_in());
}

#[tokio::test]
async fn mfa_login() {
    let h = start().await;
    let auth = AuthViewModel::new(Arc::clone(&h.client), Arc::clone(&h.session), &h.config);

    assert!(!auth.login(mock_server::MFA_EMAIL, mock_server::PASSWORD).await);
    assert!(auth.state().mfa.is_some());

    assert!(!auth.verify_mfa("000000").await);
    assert!(matches!(auth.state().error, Some(SlError::BadRequest(_))));

    assert!(auth.verify_mfa(mock_server::MFA_TOKEN).await);
    assert_eq!(
        h.session.credentials().unwrap().api_key.value(),
        mock_server::MFA_API_KEY
    );
}

#[tokio::test]
async fn register_new_account() {
    let h = start().await;
    let auth = AuthViewModel::new(Arc::clone(&h.client), Arc::clone(&h.session), &h.config);

    assert!(auth.register("new@example.com", "longpassword").await);
    assert_eq!(auth.state().registered_email.as_deref(), Some("new@example.com"));

    assert!(!auth.register("new@example.com", "longpassword").await);
    assert!(matches!(auth.state().error, Some(SlError::BadRequest(_))));
}

#[tokio::test]
async fn wrong_api_key_is_invalid() {
    let h = start().await;
    h.session.sign_in(ApiKey::new("not-the-key"));
    let aliases = AliasesViewModel::new(Arc::clone(&h.client), Arc::clone(&h.session), &h.config);

    aliases.fetch_more().await;

    assert_eq!(aliases.snapshot().error, Some(SlError::InvalidApiKey));
    assert!(aliases.snapshot().items.is_empty());
}

#[tokio::test]
async fn aliases_paginate_search_and_mutate() {
    let h = start().await;
    h.sign_in();
    let aliases = AliasesViewModel::new(Arc::clone(&h.client), Arc::clone(&h.session), &h.config);
    let seeded = mock_server::SEEDED_ALIASES as usize;

    aliases.fetch_more_if_needed(None).await;
    while aliases.snapshot().has_more {
        let last = aliases.snapshot().items.last().map(|a| a.id);
        aliases.fetch_more_if_needed(last).await;
    }
    let snapshot = aliases.snapshot();
    assert_eq!(snapshot.items.len(), seeded);
    assert_eq!(snapshot.error, None);

    aliases.refresh().await;
    assert_eq!(aliases.snapshot().items.len(), mock_server::PAGE_SIZE);

    aliases.search(Some("alias4".to_string())).await;
    assert_eq!(aliases.snapshot().items.len(), 7);
    aliases.search(None).await;

    let newest = aliases.snapshot().items[0].id;
    aliases.toggle(newest).await;
    aliases.set_status(AliasStatus::Active);
    assert!(aliases.filtered_aliases().iter().any(|a| a.id == newest));

    aliases.update_note(newest, Some("groceries".to_string())).await;
    assert_eq!(aliases.snapshot().items[0].note.as_deref(), Some("groceries"));

    aliases.delete(newest).await;
    assert!(aliases.snapshot().items.iter().all(|a| a.id != newest));
    aliases.delete(newest).await;
    assert!(aliases.snapshot().error.is_some());
    aliases.clear_error();

    aliases.random(RandomMode::Word, Some("newsletter".to_string())).await;
    let created = aliases.snapshot().items[0].clone();
    assert_eq!(created.note.as_deref(), Some("newsletter"));
    assert!(created.enabled);

    aliases.refresh().await;
    assert_eq!(aliases.snapshot().items[0].id, created.id);
}

#[tokio::test]
async fn alias_detail_contacts() {
    let h = start().await;
    h.sign_in();
    let detail = AliasDetailViewModel::new(Arc::clone(&h.client), Arc::clone(&h.session), 1, &h.config);

    detail.fetch_more_activities().await;
    detail.fetch_more_contacts().await;
    assert_eq!(detail.activities().items.len(), 3);
    assert!(!detail.activities().has_more);
    assert_eq!(detail.contacts().items.len(), 1);

    detail.create_contact("friend@example.com").await;
    assert_eq!(detail.contacts().error, Some(SlError::DuplicatedContact));
    detail.clear_errors();

    detail.create_contact("other@example.com").await;
    let contacts = detail.contacts().items;
    assert_eq!(contacts.len(), 2);
    assert_eq!(contacts[0].contact, "other@example.com");
}

#[tokio::test]
async fn mailboxes_lifecycle() {
    let h = start().await;
    h.sign_in();
    let mailboxes = MailboxesViewModel::new(Arc::clone(&h.client), Arc::clone(&h.session), &h.config);

    mailboxes.fetch(false).await;
    assert_eq!(mailboxes.snapshot().items.len(), 2);

    mailboxes.add("third@example.com").await;
    let added = mailboxes.snapshot().items.last().unwrap().clone();
    assert_eq!(added.email, "third@example.com");
    assert!(!added.verified);

    mailboxes.make_default(added.id).await;
    let defaults: Vec<i64> = mailboxes
        .snapshot()
        .items
        .iter()
        .filter(|m| m.default)
        .map(|m| m.id)
        .collect();
    assert_eq!(defaults, vec![added.id]);

    mailboxes.delete(added.id).await;
    assert!(matches!(mailboxes.snapshot().error, Some(SlError::BadRequest(_))));
    assert_eq!(mailboxes.snapshot().items.len(), 3);
    mailboxes.clear_error();

    mailboxes.delete(1).await;
    assert_eq!(mailboxes.snapshot().items.len(), 2);
}
