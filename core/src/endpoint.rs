//! Typed descriptors for every SimpleLogin API call.
//!
//! # Design
//! `Endpoint` has one variant per operation, each holding only what that
//! operation needs. `build` is a single exhaustive match that turns a
//! descriptor into an `HttpRequest`; it reads nothing but the descriptor,
//! so the same descriptor always yields the same request.
//!
//! Authenticated variants hold a `Credentials` snapshot rather than an
//! optional key: a request without `Authentication` cannot be expressed
//! for them. Login, MFA and register carry a bare base URL instead.

use std::fmt;

use serde_json::{json, Value};
use url::Url;

use crate::http::{
    HttpMethod, HttpRequest, APPLICATION_JSON, AUTHENTICATION_HEADER, CONTENT_TYPE_HEADER,
};
use crate::session::{ApiKey, Credentials};
use crate::types::{AliasId, MailboxId, RandomMode};

/// One API call, before serialization.
#[derive(Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Page of aliases. A non-empty `search_term` turns this into a POST
    /// search; `page_id` stays in the query either way.
    Aliases {
        credentials: Credentials,
        page: u32,
        search_term: Option<String>,
    },
    AliasActivities {
        credentials: Credentials,
        alias_id: AliasId,
        page: u32,
    },
    Contacts {
        credentials: Credentials,
        alias_id: AliasId,
        page: u32,
    },
    CreateContact {
        credentials: Credentials,
        alias_id: AliasId,
        contact: String,
    },
    Login {
        base_url: Url,
        email: String,
        password: String,
        device: String,
    },
    Mfa {
        base_url: Url,
        mfa_token: String,
        mfa_key: String,
        device: String,
    },
    Register {
        base_url: Url,
        email: String,
        password: String,
    },
    Mailboxes {
        credentials: Credentials,
    },
    CreateMailbox {
        credentials: Credentials,
        email: String,
    },
    MakeDefaultMailbox {
        credentials: Credentials,
        mailbox_id: MailboxId,
    },
    DeleteMailbox {
        credentials: Credentials,
        mailbox_id: MailboxId,
    },
    UpdateAliasMailboxes {
        credentials: Credentials,
        alias_id: AliasId,
        mailbox_ids: Vec<MailboxId>,
    },
    /// `None` clears the name on the server.
    UpdateAliasName {
        credentials: Credentials,
        alias_id: AliasId,
        name: Option<String>,
    },
    /// `None` clears the note on the server.
    UpdateAliasNote {
        credentials: Credentials,
        alias_id: AliasId,
        note: Option<String>,
    },
    ToggleAlias {
        credentials: Credentials,
        alias_id: AliasId,
    },
    DeleteAlias {
        credentials: Credentials,
        alias_id: AliasId,
    },
    RandomAlias {
        credentials: Credentials,
        mode: RandomMode,
        note: Option<String>,
    },
    UserInfo {
        credentials: Credentials,
    },
}

/// Fieldless tag of an `Endpoint`, used to pick the status-code mapping
/// when parsing a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    Aliases,
    AliasActivities,
    Contacts,
    CreateContact,
    Login,
    Mfa,
    Register,
    Mailboxes,
    CreateMailbox,
    MakeDefaultMailbox,
    DeleteMailbox,
    UpdateAliasMailboxes,
    UpdateAliasName,
    UpdateAliasNote,
    ToggleAlias,
    DeleteAlias,
    RandomAlias,
    UserInfo,
}

impl EndpointKind {
    /// Whether requests of this kind carry the `Authentication` header.
    pub fn is_authenticated(self) -> bool {
        !matches!(
            self,
            EndpointKind::Login | EndpointKind::Mfa | EndpointKind::Register
        )
    }
}

impl Endpoint {
    pub fn kind(&self) -> EndpointKind {
        match self {
            Endpoint::Aliases { .. } => EndpointKind::Aliases,
            Endpoint::AliasActivities { .. } => EndpointKind::AliasActivities,
            Endpoint::Contacts { .. } => EndpointKind::Contacts,
            Endpoint::CreateContact { .. } => EndpointKind::CreateContact,
            Endpoint::Login { .. } => EndpointKind::Login,
            Endpoint::Mfa { .. } => EndpointKind::Mfa,
            Endpoint::Register { .. } => EndpointKind::Register,
            Endpoint::Mailboxes { .. } => EndpointKind::Mailboxes,
            Endpoint::CreateMailbox { .. } => EndpointKind::CreateMailbox,
            Endpoint::MakeDefaultMailbox { .. } => EndpointKind::MakeDefaultMailbox,
            Endpoint::DeleteMailbox { .. } => EndpointKind::DeleteMailbox,
            Endpoint::UpdateAliasMailboxes { .. } => EndpointKind::UpdateAliasMailboxes,
            Endpoint::UpdateAliasName { .. } => EndpointKind::UpdateAliasName,
            Endpoint::UpdateAliasNote { .. } => EndpointKind::UpdateAliasNote,
            Endpoint::ToggleAlias { .. } => EndpointKind::ToggleAlias,
            Endpoint::DeleteAlias { .. } => EndpointKind::DeleteAlias,
            Endpoint::RandomAlias { .. } => EndpointKind::RandomAlias,
            Endpoint::UserInfo { .. } => EndpointKind::UserInfo,
        }
    }

    /// URL path of the call, with identifiers interpolated.
    pub fn path(&self) -> String {
        match self {
            Endpoint::Aliases { .. } => "/api/v2/aliases".to_string(),
            Endpoint::AliasActivities { alias_id, .. } => {
                format!("/api/aliases/{alias_id}/activities")
            }
            Endpoint::Contacts { alias_id, .. } | Endpoint::CreateContact { alias_id, .. } => {
                format!("/api/aliases/{alias_id}/contacts")
            }
            Endpoint::Login { .. } => "/api/auth/login".to_string(),
            Endpoint::Mfa { .. } => "/api/auth/mfa".to_string(),
            Endpoint::Register { .. } => "/api/auth/register".to_string(),
            Endpoint::Mailboxes { .. } | Endpoint::CreateMailbox { .. } => {
                "/api/mailboxes".to_string()
            }
            Endpoint::MakeDefaultMailbox { mailbox_id, .. }
            | Endpoint::DeleteMailbox { mailbox_id, .. } => {
                format!("/api/mailboxes/{mailbox_id}")
            }
            Endpoint::UpdateAliasMailboxes { alias_id, .. }
            | Endpoint::UpdateAliasName { alias_id, .. }
            | Endpoint::UpdateAliasNote { alias_id, .. }
            | Endpoint::DeleteAlias { alias_id, .. } => format!("/api/aliases/{alias_id}"),
            Endpoint::ToggleAlias { alias_id, .. } => format!("/api/aliases/{alias_id}/toggle"),
            Endpoint::RandomAlias { .. } => "/api/alias/random/new".to_string(),
            Endpoint::UserInfo { .. } => "/api/user_info".to_string(),
        }
    }

    /// Serialize the descriptor into a request.
    pub fn build(&self) -> HttpRequest {
        let path = self.path();
        let builder = match self {
            Endpoint::Aliases {
                credentials,
                page,
                search_term,
            } => {
                let builder = RequestBuilder::authenticated(HttpMethod::Get, credentials, &path)
                    .query("page_id", page.to_string());
                match search_term.as_deref().filter(|term| !term.is_empty()) {
                    Some(term) => builder
                        .method(HttpMethod::Post)
                        .json(json!({ "query": term })),
                    None => builder,
                }
            }
            Endpoint::AliasActivities {
                credentials, page, ..
            }
            | Endpoint::Contacts {
                credentials, page, ..
            } => RequestBuilder::authenticated(HttpMethod::Get, credentials, &path)
                .query("page_id", page.to_string()),
            Endpoint::CreateContact {
                credentials,
                contact,
                ..
            } => RequestBuilder::authenticated(HttpMethod::Post, credentials, &path)
                .json(json!({ "contact": contact })),
            Endpoint::Login {
                base_url,
                email,
                password,
                device,
            } => RequestBuilder::anonymous(HttpMethod::Post, base_url, &path).json(json!({
                "email": email,
                "password": password,
                "device": device,
            })),
            Endpoint::Mfa {
                base_url,
                mfa_token,
                mfa_key,
                device,
            } => RequestBuilder::anonymous(HttpMethod::Post, base_url, &path).json(json!({
                "mfa_token": mfa_token,
                "mfa_key": mfa_key,
                "device": device,
            })),
            Endpoint::Register {
                base_url,
                email,
                password,
            } => RequestBuilder::anonymous(HttpMethod::Post, base_url, &path).json(json!({
                "email": email,
                "password": password,
            })),
            Endpoint::Mailboxes { credentials } | Endpoint::UserInfo { credentials } => {
                RequestBuilder::authenticated(HttpMethod::Get, credentials, &path)
            }
            Endpoint::CreateMailbox { credentials, email } => {
                RequestBuilder::authenticated(HttpMethod::Post, credentials, &path)
                    .json(json!({ "email": email }))
            }
            Endpoint::MakeDefaultMailbox { credentials, .. } => {
                RequestBuilder::authenticated(HttpMethod::Put, credentials, &path)
                    .json(json!({ "default": true }))
            }
            Endpoint::DeleteMailbox { credentials, .. }
            | Endpoint::DeleteAlias { credentials, .. } => {
                RequestBuilder::authenticated(HttpMethod::Delete, credentials, &path)
            }
            Endpoint::UpdateAliasMailboxes {
                credentials,
                mailbox_ids,
                ..
            } => RequestBuilder::authenticated(HttpMethod::Put, credentials, &path)
                .json(json!({ "mailbox_ids": mailbox_ids })),
            Endpoint::UpdateAliasName {
                credentials, name, ..
            } => RequestBuilder::authenticated(HttpMethod::Put, credentials, &path)
                .json(json!({ "name": name })),
            Endpoint::UpdateAliasNote {
                credentials, note, ..
            } => RequestBuilder::authenticated(HttpMethod::Put, credentials, &path)
                .json(json!({ "note": note })),
            Endpoint::ToggleAlias { credentials, .. } => {
                RequestBuilder::authenticated(HttpMethod::Post, credentials, &path)
            }
            Endpoint::RandomAlias {
                credentials,
                mode,
                note,
            } => {
                let builder = RequestBuilder::authenticated(HttpMethod::Post, credentials, &path)
                    .query("mode", mode.as_str().to_string());
                match note {
                    Some(note) => builder.json(json!({ "note": note })),
                    None => builder,
                }
            }
        };
        builder.finish()
    }
}

// Passwords and keys live in several variants; print only the shape.
impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("kind", &self.kind())
            .field("path", &self.path())
            .finish()
    }
}

struct RequestBuilder<'a> {
    method: HttpMethod,
    url: Url,
    query: Vec<(&'static str, String)>,
    api_key: Option<&'a ApiKey>,
    body: Option<Value>,
}

impl<'a> RequestBuilder<'a> {
    fn anonymous(method: HttpMethod, base_url: &Url, path: &str) -> Self {
        Self {
            method,
            url: endpoint_url(base_url, path),
            query: Vec::new(),
            api_key: None,
            body: None,
        }
    }

    fn authenticated(method: HttpMethod, credentials: &'a Credentials, path: &str) -> Self {
        Self {
            api_key: Some(&credentials.api_key),
            ..Self::anonymous(method, &credentials.base_url, path)
        }
    }

    fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    fn query(mut self, name: &'static str, value: String) -> Self {
        self.query.push((name, value));
        self
    }

    fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    fn finish(self) -> HttpRequest {
        let mut url = self.url;
        if !self.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.query.iter().map(|(k, v)| (*k, v.as_str())));
        }

        let mut headers = Vec::with_capacity(2);
        if let Some(key) = self.api_key {
            headers.push((AUTHENTICATION_HEADER.to_string(), key.value().to_string()));
        }
        if self.body.is_some() {
            headers.push((CONTENT_TYPE_HEADER.to_string(), APPLICATION_JSON.to_string()));
        }

        HttpRequest {
            method: self.method,
            url: url.into(),
            headers,
            body: self.body.map(|b| b.to_string()),
        }
    }
}

/// Base URL with path replaced and query/fragment dropped. Scheme, host and
/// port are kept; `base` itself is untouched.
fn endpoint_url(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    url.set_path(path);
    url.set_query(None);
    url.set_fragment(None);
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials::new(
            Url::parse("https://app.simplelogin.io").unwrap(),
            ApiKey::new("key-123"),
        )
    }

    fn body(req: &HttpRequest) -> Value {
        serde_json::from_str(req.body.as_deref().unwrap()).unwrap()
    }

    #[test]
    fn aliases_without_search_is_get_with_page_id() {
        let req = Endpoint::Aliases {
            credentials: credentials(),
            page: 2,
            search_term: None,
        }
        .build();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "https://app.simplelogin.io/api/v2/aliases?page_id=2");
        assert!(req.body.is_none());
        assert_eq!(req.header(AUTHENTICATION_HEADER), Some("key-123"));
        assert_eq!(req.header(CONTENT_TYPE_HEADER), None);
    }

    #[test]
    fn aliases_with_search_is_post_with_query_body() {
        let req = Endpoint::Aliases {
            credentials: credentials(),
            page: 0,
            search_term: Some("shop".to_string()),
        }
        .build();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://app.simplelogin.io/api/v2/aliases?page_id=0");
        assert_eq!(body(&req), json!({ "query": "shop" }));
        assert_eq!(req.header(CONTENT_TYPE_HEADER), Some("application/json"));
    }

    #[test]
    fn empty_search_term_counts_as_absent() {
        let req = Endpoint::Aliases {
            credentials: credentials(),
            page: 0,
            search_term: Some(String::new()),
        }
        .build();
        assert_eq!(req.method, HttpMethod::Get);
        assert!(req.body.is_none());
    }

    #[test]
    fn null_note_is_serialized_explicitly() {
        let cleared = Endpoint::UpdateAliasNote {
            credentials: credentials(),
            alias_id: 9,
            note: None,
        }
        .build();
        let set = Endpoint::UpdateAliasNote {
            credentials: credentials(),
            alias_id: 9,
            note: Some("x".to_string()),
        }
        .build();

        assert_eq!(cleared.method, HttpMethod::Put);
        assert_eq!(cleared.url, "https://app.simplelogin.io/api/aliases/9");
        let cleared = body(&cleared);
        assert!(cleared.as_object().unwrap().contains_key("note"));
        assert!(cleared["note"].is_null());
        assert_eq!(body(&set)["note"], "x");
    }

    #[test]
    fn null_name_is_serialized_explicitly() {
        let req = Endpoint::UpdateAliasName {
            credentials: credentials(),
            alias_id: 3,
            name: None,
        }
        .build();
        assert_eq!(body(&req), json!({ "name": null }));
    }

    #[test]
    fn update_mailboxes_sends_ids() {
        let req = Endpoint::UpdateAliasMailboxes {
            credentials: credentials(),
            alias_id: 3,
            mailbox_ids: vec![1, 4],
        }
        .build();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(body(&req), json!({ "mailbox_ids": [1, 4] }));
    }

    #[test]
    fn login_never_carries_api_key() {
        let req = Endpoint::Login {
            base_url: Url::parse("https://app.simplelogin.io").unwrap(),
            email: "john@example.com".to_string(),
            password: "hunter2".to_string(),
            device: "phone".to_string(),
        }
        .build();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://app.simplelogin.io/api/auth/login");
        assert_eq!(req.header(AUTHENTICATION_HEADER), None);
        assert_eq!(
            body(&req),
            json!({ "email": "john@example.com", "password": "hunter2", "device": "phone" })
        );
    }

    #[test]
    fn base_url_path_and_query_are_replaced() {
        let base = Url::parse("http://localhost:7777/ignored/path?x=1#frag").unwrap();
        let creds = Credentials::new(base.clone(), ApiKey::new("k"));
        let req = Endpoint::AliasActivities {
            credentials: creds,
            alias_id: 12,
            page: 1,
        }
        .build();
        assert_eq!(
            req.url,
            "http://localhost:7777/api/aliases/12/activities?page_id=1"
        );
        assert_eq!(base.as_str(), "http://localhost:7777/ignored/path?x=1#frag");
    }

    #[test]
    fn random_alias_puts_mode_in_query() {
        let req = Endpoint::RandomAlias {
            credentials: credentials(),
            mode: RandomMode::Word,
            note: None,
        }
        .build();
        assert_eq!(
            req.url,
            "https://app.simplelogin.io/api/alias/random/new?mode=word"
        );
        assert!(req.body.is_none());
    }

    #[test]
    fn build_is_deterministic() {
        let endpoint = Endpoint::Contacts {
            credentials: credentials(),
            alias_id: 5,
            page: 3,
        };
        assert_eq!(endpoint.build(), endpoint.build());
    }

    #[test]
    fn authenticated_kinds_match_headers() {
        let endpoints = vec![
            Endpoint::Mailboxes {
                credentials: credentials(),
            },
            Endpoint::UserInfo {
                credentials: credentials(),
            },
            Endpoint::ToggleAlias {
                credentials: credentials(),
                alias_id: 1,
            },
            Endpoint::Register {
                base_url: Url::parse("https://app.simplelogin.io").unwrap(),
                email: "a@b.c".to_string(),
                password: "pw".to_string(),
            },
        ];
        for endpoint in endpoints {
            let req = endpoint.build();
            assert_eq!(
                req.header(AUTHENTICATION_HEADER).is_some(),
                endpoint.kind().is_authenticated(),
                "{:?}",
                endpoint.kind()
            );
        }
    }

    #[test]
    fn debug_hides_password() {
        let endpoint = Endpoint::Login {
            base_url: Url::parse("https://app.simplelogin.io").unwrap(),
            email: "john@example.com".to_string(),
            password: "hunter2".to_string(),
            device: "phone".to_string(),
        };
        assert!(!format!("{endpoint:?}").contains("hunter2"));
    }
}
