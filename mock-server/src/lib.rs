//! In-memory stand-in for the SimpleLogin HTTP API.
//!
//! Serves the subset of routes the client core calls, seeded with one
//! account, a few dozen aliases and two mailboxes. Authenticated routes
//! expect the `Authentication` header to carry [`API_KEY`].

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

pub const API_KEY: &str = "mock-api-key";
pub const MFA_API_KEY: &str = "mock-mfa-api-key";
pub const EMAIL: &str = "john@example.com";
pub const PASSWORD: &str = "password";
/// Account with two-factor login enabled.
pub const MFA_EMAIL: &str = "mfa@example.com";
pub const MFA_KEY: &str = "mock-mfa-key";
pub const MFA_TOKEN: &str = "123456";
/// Account whose login answers 422.
pub const INACTIVE_EMAIL: &str = "inactive@example.com";
pub const PAGE_SIZE: usize = 20;
pub const SEEDED_ALIASES: i64 = 45;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AliasMailbox {
    pub id: i64,
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Alias {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub enabled: bool,
    pub creation_timestamp: i64,
    pub note: Option<String>,
    pub nb_block: u32,
    pub nb_forward: u32,
    pub nb_reply: u32,
    pub pinned: bool,
    pub mailboxes: Vec<AliasMailbox>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Activity {
    pub action: String,
    pub from: String,
    pub to: String,
    pub timestamp: i64,
    pub reverse_alias: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub contact: String,
    pub creation_timestamp: i64,
    pub last_email_sent_timestamp: Option<i64>,
    pub reverse_alias: String,
    pub reverse_alias_address: String,
    pub block_forward: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Mailbox {
    pub id: i64,
    pub email: String,
    pub default: bool,
    pub creation_timestamp: i64,
    pub nb_alias: u32,
    pub verified: bool,
}

#[derive(Debug, Default)]
pub struct Store {
    pub aliases: Vec<Alias>,
    pub activities: HashMap<i64, Vec<Activity>>,
    pub contacts: HashMap<i64, Vec<Contact>>,
    pub mailboxes: Vec<Mailbox>,
    pub registered: Vec<String>,
    next_id: i64,
}

impl Store {
    pub fn seeded() -> Self {
        let mut store = Store {
            next_id: 1000,
            ..Store::default()
        };
        store.mailboxes = vec![
            Mailbox {
                id: 1,
                email: EMAIL.to_string(),
                default: true,
                creation_timestamp: 1_600_000_000,
                nb_alias: SEEDED_ALIASES as u32,
                verified: true,
            },
            Mailbox {
                id: 2,
                email: "work@example.com".to_string(),
                default: false,
                creation_timestamp: 1_600_000_100,
                nb_alias: 0,
                verified: true,
            },
        ];
        // Newest first, as the real server orders them.
        store.aliases = (1..=SEEDED_ALIASES)
            .rev()
            .map(|id| Alias {
                id,
                email: format!("alias{id}@sl.local"),
                name: None,
                enabled: id % 5 != 0,
                creation_timestamp: 1_600_000_000 + id,
                note: None,
                nb_block: 0,
                nb_forward: id as u32,
                nb_reply: 0,
                pinned: false,
                mailboxes: vec![AliasMailbox {
                    id: 1,
                    email: EMAIL.to_string(),
                }],
            })
            .collect();
        store.activities.insert(
            1,
            (0..3)
                .map(|i| Activity {
                    action: if i == 2 { "reply" } else { "forward" }.to_string(),
                    from: format!("sender{i}@example.com"),
                    to: "alias1@sl.local".to_string(),
                    timestamp: 1_600_001_000 - i,
                    reverse_alias: None,
                })
                .collect(),
        );
        let contact = store.new_contact("friend@example.com");
        store.contacts.insert(1, vec![contact]);
        store
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn new_contact(&mut self, email: &str) -> Contact {
        let id = self.next_id();
        let local = email.split('@').next().unwrap_or(email);
        Contact {
            id,
            contact: email.to_string(),
            creation_timestamp: 1_600_002_000 + id,
            last_email_sent_timestamp: None,
            reverse_alias: format!("\"{local}\" <ra{id}@sl.local>"),
            reverse_alias_address: format!("ra{id}@sl.local"),
            block_forward: false,
        }
    }

    fn alias_mut(&mut self, id: i64) -> Result<&mut Alias, ApiError> {
        self.aliases
            .iter_mut()
            .find(|alias| alias.id == id)
            .ok_or_else(|| ApiError::not_found("Alias not found"))
    }
}

pub type Db = Arc<RwLock<Store>>;

/// JSON error body `{"error": ...}` with a status.
#[derive(Debug)]
pub struct ApiError(StatusCode, String);

impl ApiError {
    fn bad_request(msg: &str) -> Self {
        ApiError(StatusCode::BAD_REQUEST, msg.to_string())
    }

    fn not_found(msg: &str) -> Self {
        ApiError(StatusCode::NOT_FOUND, msg.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

pub fn app() -> Router {
    app_with_store(Store::seeded())
}

pub fn app_with_store(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/mfa", post(mfa))
        .route("/api/auth/register", post(register))
        .route("/api/user_info", get(user_info))
        .route("/api/v2/aliases", get(list_aliases).post(search_aliases))
        .route("/api/aliases/{id}", put(update_alias).delete(delete_alias))
        .route("/api/aliases/{id}/toggle", post(toggle_alias))
        .route("/api/aliases/{id}/activities", get(list_activities))
        .route("/api/aliases/{id}/contacts", get(list_contacts).post(create_contact))
        .route("/api/alias/random/new", post(random_alias))
        .route("/api/mailboxes", get(list_mailboxes).post(create_mailbox))
        .route("/api/mailboxes/{id}", put(update_mailbox).delete(delete_mailbox))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn authorize(headers: &HeaderMap) -> ApiResult<()> {
    match headers.get("Authentication").and_then(|v| v.to_str().ok()) {
        Some(API_KEY) | Some(MFA_API_KEY) => Ok(()),
        _ => Err(ApiError(StatusCode::UNAUTHORIZED, "Wrong api key".to_string())),
    }
}

fn page<T: Clone>(items: &[T], page_id: Option<usize>) -> ApiResult<Vec<T>> {
    let page_id = page_id.ok_or_else(|| ApiError::bad_request("page_id must be provided"))?;
    Ok(items
        .iter()
        .skip(page_id * PAGE_SIZE)
        .take(PAGE_SIZE)
        .cloned()
        .collect())
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub page_id: Option<usize>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub device: String,
}

async fn login(Json(input): Json<LoginRequest>) -> ApiResult<Json<Value>> {
    info!(email = %input.email, device = %input.device, "login");
    match (input.email.as_str(), input.password == PASSWORD) {
        (_, false) => Err(ApiError::bad_request("Email or password incorrect")),
        (INACTIVE_EMAIL, true) => Err(ApiError(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Account needs reactivation".to_string(),
        )),
        (MFA_EMAIL, true) => Ok(Json(json!({
            "api_key": null,
            "email": MFA_EMAIL,
            "name": "Mfa User",
            "mfa_enabled": true,
            "mfa_key": MFA_KEY,
        }))),
        (EMAIL, true) => Ok(Json(json!({
            "api_key": API_KEY,
            "email": EMAIL,
            "name": "John Wick",
            "mfa_enabled": false,
            "mfa_key": null,
        }))),
        _ => Err(ApiError::bad_request("Email or password incorrect")),
    }
}

#[derive(Deserialize)]
pub struct MfaRequest {
    pub mfa_token: String,
    pub mfa_key: String,
    pub device: String,
}

async fn mfa(Json(input): Json<MfaRequest>) -> ApiResult<Json<Value>> {
    if input.mfa_key != MFA_KEY {
        return Err(ApiError(StatusCode::UNAUTHORIZED, "Invalid mfa_key".to_string()));
    }
    if input.mfa_token != MFA_TOKEN {
        return Err(ApiError::bad_request("Wrong TOTP Token"));
    }
    info!(device = %input.device, "mfa verified");
    Ok(Json(json!({
        "api_key": MFA_API_KEY,
        "email": MFA_EMAIL,
        "name": "Mfa User",
        "mfa_enabled": true,
        "mfa_key": null,
    })))
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

async fn register(
    State(db): State<Db>,
    Json(input): Json<RegisterRequest>,
) -> ApiResult<Json<Value>> {
    if input.password.len() < 8 {
        return Err(ApiError::bad_request("password too short"));
    }
    let mut store = db.write().await;
    if input.email == EMAIL || store.registered.contains(&input.email) {
        return Err(ApiError::bad_request("Email already used"));
    }
    store.registered.push(input.email);
    Ok(Json(json!({ "msg": "User needs to confirm their account" })))
}

async fn user_info(headers: HeaderMap) -> ApiResult<Json<Value>> {
    authorize(&headers)?;
    Ok(Json(json!({
        "name": "John Wick",
        "email": EMAIL,
        "is_premium": true,
        "in_trial": false,
        "profile_picture_url": null,
    })))
}

async fn list_aliases(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Value>> {
    authorize(&headers)?;
    let store = db.read().await;
    let aliases = page(&store.aliases, query.page_id)?;
    Ok(Json(json!({ "aliases": aliases })))
}

#[derive(Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

async fn search_aliases(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
    Json(search): Json<SearchRequest>,
) -> ApiResult<Json<Value>> {
    authorize(&headers)?;
    let store = db.read().await;
    let term = search.query.to_lowercase();
    let matching: Vec<Alias> = store
        .aliases
        .iter()
        .filter(|alias| {
            alias.email.contains(&term)
                || alias.note.as_deref().is_some_and(|n| n.to_lowercase().contains(&term))
                || alias.name.as_deref().is_some_and(|n| n.to_lowercase().contains(&term))
        })
        .cloned()
        .collect();
    let aliases = page(&matching, query.page_id)?;
    Ok(Json(json!({ "aliases": aliases })))
}

async fn update_alias(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<Value>,
) -> ApiResult<Json<Value>> {
    authorize(&headers)?;
    let mut store = db.write().await;
    let mailboxes = store.mailboxes.clone();
    let alias = store.alias_mut(id)?;
    if let Some(name) = input.get("name") {
        alias.name = name.as_str().map(str::to_string);
    }
    if let Some(note) = input.get("note") {
        alias.note = note.as_str().map(str::to_string);
    }
    if let Some(ids) = input.get("mailbox_ids").and_then(Value::as_array) {
        let selected: Vec<AliasMailbox> = mailboxes
            .iter()
            .filter(|m| ids.iter().any(|id| id.as_i64() == Some(m.id)))
            .map(|m| AliasMailbox {
                id: m.id,
                email: m.email.clone(),
            })
            .collect();
        if selected.is_empty() {
            return Err(ApiError::bad_request("Must choose at least one mailbox"));
        }
        alias.mailboxes = selected;
    }
    Ok(Json(json!({ "ok": true })))
}

async fn delete_alias(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    authorize(&headers)?;
    let mut store = db.write().await;
    let before = store.aliases.len();
    store.aliases.retain(|alias| alias.id != id);
    if store.aliases.len() == before {
        return Err(ApiError::not_found("Alias not found"));
    }
    info!(id, "alias deleted");
    Ok(Json(json!({ "deleted": true })))
}

async fn toggle_alias(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    authorize(&headers)?;
    let mut store = db.write().await;
    let alias = store.alias_mut(id)?;
    alias.enabled = !alias.enabled;
    Ok(Json(json!({ "enabled": alias.enabled })))
}

async fn list_activities(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Value>> {
    authorize(&headers)?;
    let store = db.read().await;
    let activities = store.activities.get(&id).cloned().unwrap_or_default();
    Ok(Json(json!({ "activities": page(&activities, query.page_id)? })))
}

async fn list_contacts(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Value>> {
    authorize(&headers)?;
    let store = db.read().await;
    let contacts = store.contacts.get(&id).cloned().unwrap_or_default();
    Ok(Json(json!({ "contacts": page(&contacts, query.page_id)? })))
}

#[derive(Deserialize)]
pub struct CreateContactRequest {
    pub contact: String,
}

async fn create_contact(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<CreateContactRequest>,
) -> ApiResult<(StatusCode, Json<Contact>)> {
    authorize(&headers)?;
    let mut store = db.write().await;
    store.alias_mut(id)?;
    let exists = store
        .contacts
        .get(&id)
        .is_some_and(|contacts| contacts.iter().any(|c| c.contact == input.contact));
    if exists {
        return Err(ApiError(
            StatusCode::CONFLICT,
            format!("{} already added", input.contact),
        ));
    }
    let contact = store.new_contact(&input.contact);
    store.contacts.entry(id).or_default().insert(0, contact.clone());
    Ok((StatusCode::CREATED, Json(contact)))
}

#[derive(Deserialize)]
pub struct RandomQuery {
    pub mode: Option<String>,
}

#[derive(Deserialize)]
pub struct RandomRequest {
    pub note: Option<String>,
}

async fn random_alias(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<RandomQuery>,
    body: String,
) -> ApiResult<(StatusCode, Json<Alias>)> {
    authorize(&headers)?;
    let note = if body.trim().is_empty() {
        None
    } else {
        serde_json::from_str::<RandomRequest>(&body)
            .map_err(|_| ApiError::bad_request("request body is not valid json"))?
            .note
    };
    let mut store = db.write().await;
    let id = store.next_id();
    let email = match query.mode.as_deref() {
        Some("word") | None => format!("random_word{id}@sl.local"),
        Some("uuid") => format!("0000-{id:08}@sl.local"),
        Some(_) => return Err(ApiError::bad_request("mode must be either word or uuid")),
    };
    let mailbox = store
        .mailboxes
        .iter()
        .find(|m| m.default)
        .map(|m| AliasMailbox {
            id: m.id,
            email: m.email.clone(),
        });
    let alias = Alias {
        id,
        email,
        name: None,
        enabled: true,
        creation_timestamp: 1_700_000_000 + id,
        note,
        nb_block: 0,
        nb_forward: 0,
        nb_reply: 0,
        pinned: false,
        mailboxes: mailbox.into_iter().collect(),
    };
    store.aliases.insert(0, alias.clone());
    info!(id, "random alias created");
    Ok((StatusCode::CREATED, Json(alias)))
}

async fn list_mailboxes(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    authorize(&headers)?;
    let store = db.read().await;
    Ok(Json(json!({ "mailboxes": store.mailboxes })))
}

#[derive(Deserialize)]
pub struct CreateMailboxRequest {
    pub email: String,
}

async fn create_mailbox(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateMailboxRequest>,
) -> ApiResult<(StatusCode, Json<Mailbox>)> {
    authorize(&headers)?;
    if !input.email.contains('@') {
        return Err(ApiError::bad_request("Invalid email"));
    }
    let mut store = db.write().await;
    if store.mailboxes.iter().any(|m| m.email == input.email) {
        return Err(ApiError::bad_request(&format!("{} already used", input.email)));
    }
    let id = store.next_id();
    let mailbox = Mailbox {
        id,
        email: input.email,
        default: false,
        creation_timestamp: 1_700_000_000 + id,
        nb_alias: 0,
        verified: false,
    };
    store.mailboxes.push(mailbox.clone());
    Ok((StatusCode::CREATED, Json(mailbox)))
}

#[derive(Deserialize)]
pub struct UpdateMailboxRequest {
    #[serde(default)]
    pub default: bool,
}

async fn update_mailbox(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<UpdateMailboxRequest>,
) -> ApiResult<Json<Value>> {
    authorize(&headers)?;
    let mut store = db.write().await;
    if !store.mailboxes.iter().any(|m| m.id == id) {
        return Err(ApiError::not_found("Mailbox not found"));
    }
    if input.default {
        for mailbox in store.mailboxes.iter_mut() {
            mailbox.default = mailbox.id == id;
        }
    }
    Ok(Json(json!({ "updated": true })))
}

async fn delete_mailbox(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    authorize(&headers)?;
    let mut store = db.write().await;
    let mailbox = store
        .mailboxes
        .iter()
        .find(|m| m.id == id)
        .ok_or_else(|| ApiError::not_found("Mailbox not found"))?;
    if mailbox.default {
        return Err(ApiError::bad_request("You cannot delete the default mailbox"));
    }
    store.mailboxes.retain(|m| m.id != id);
    Ok(Json(json!({ "deleted": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_store_orders_aliases_newest_first() {
        let store = Store::seeded();
        assert_eq!(store.aliases.len(), SEEDED_ALIASES as usize);
        assert_eq!(store.aliases[0].id, SEEDED_ALIASES);
        assert!(store.aliases[0].creation_timestamp > store.aliases[1].creation_timestamp);
    }

    #[test]
    fn exactly_one_default_mailbox() {
        let store = Store::seeded();
        assert_eq!(store.mailboxes.iter().filter(|m| m.default).count(), 1);
    }

    #[test]
    fn page_requires_page_id() {
        let items = vec![1, 2, 3];
        assert!(page(&items, None).is_err());
        assert_eq!(page(&items, Some(0)).unwrap(), vec![1, 2, 3]);
        assert!(page(&items, Some(1)).unwrap().is_empty());
    }

    #[test]
    fn contacts_get_unique_reverse_aliases() {
        let mut store = Store::seeded();
        let a = store.new_contact("a@example.com");
        let b = store.new_contact("b@example.com");
        assert_ne!(a.reverse_alias_address, b.reverse_alias_address);
        assert_eq!(a.reverse_alias, format!("\"a\" <{}>", a.reverse_alias_address));
    }

    #[test]
    fn alias_serializes_null_note() {
        let store = Store::seeded();
        let json = serde_json::to_value(&store.aliases[0]).unwrap();
        assert!(json["note"].is_null());
        assert_eq!(json["mailboxes"][0]["email"], EMAIL);
    }
}
