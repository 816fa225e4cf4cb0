//! Domain DTOs for the SimpleLogin API.
//!
//! # Design
//! These types mirror the server's JSON but are defined independently from
//! the mock-server crate; integration tests catch schema drift. Optional
//! server fields use `#[serde(default)]` so older servers still decode.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub type AliasId = i64;
pub type MailboxId = i64;
pub type ContactId = i64;

/// A decodable response body. `NAME` is what `FailToParseObject` reports.
pub trait ApiObject: DeserializeOwned {
    const NAME: &'static str;
}

/// A record held by a `PagedList`; `key` identifies it for in-place
/// updates and de-duplication across pages.
pub trait Record: Clone {
    type Key: PartialEq + Clone + std::fmt::Debug;

    /// Whether a later page may repeat a record that is already loaded.
    /// Records without a server id keep every copy the server sends.
    const DEDUPLICATE: bool = true;

    fn key(&self) -> Self::Key;
}

/// Mailbox reference embedded in an alias.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AliasMailbox {
    pub id: MailboxId,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Alias {
    pub id: AliasId,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub enabled: bool,
    pub creation_timestamp: i64,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub nb_block: u32,
    #[serde(default)]
    pub nb_forward: u32,
    #[serde(default)]
    pub nb_reply: u32,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub mailboxes: Vec<AliasMailbox>,
}

impl Record for Alias {
    type Key = AliasId;

    fn key(&self) -> AliasId {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AliasArray {
    pub aliases: Vec<Alias>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityAction {
    Forward,
    Reply,
    Block,
    Bounced,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AliasActivity {
    pub action: ActivityAction,
    pub from: String,
    pub to: String,
    pub timestamp: i64,
    #[serde(default)]
    pub reverse_alias: Option<String>,
}

impl Record for AliasActivity {
    // Activities have no server id; two can share every field.
    type Key = (i64, ActivityAction, String, String);

    const DEDUPLICATE: bool = false;

    fn key(&self) -> Self::Key {
        (self.timestamp, self.action, self.from.clone(), self.to.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivityArray {
    pub activities: Vec<AliasActivity>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contact {
    pub id: ContactId,
    pub contact: String,
    pub creation_timestamp: i64,
    #[serde(default)]
    pub last_email_sent_timestamp: Option<i64>,
    pub reverse_alias: String,
    #[serde(default)]
    pub reverse_alias_address: Option<String>,
    #[serde(default)]
    pub block_forward: bool,
}

impl Record for Contact {
    type Key = ContactId;

    fn key(&self) -> ContactId {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactArray {
    pub contacts: Vec<Contact>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Mailbox {
    pub id: MailboxId,
    pub email: String,
    pub default: bool,
    pub creation_timestamp: i64,
    #[serde(default)]
    pub nb_alias: u32,
    #[serde(default = "default_verified")]
    pub verified: bool,
}

fn default_verified() -> bool {
    true
}

impl Record for Mailbox {
    type Key = MailboxId;

    fn key(&self) -> MailboxId {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MailboxArray {
    pub mailboxes: Vec<Mailbox>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserInfo {
    pub name: String,
    pub email: String,
    pub is_premium: bool,
    #[serde(default)]
    pub in_trial: bool,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
}

/// Login and MFA responses. `api_key` is absent when MFA is still pending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserLogin {
    #[serde(default)]
    pub api_key: Option<String>,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mfa_enabled: bool,
    #[serde(default)]
    pub mfa_key: Option<String>,
}

/// Random alias flavour for `POST /api/alias/random/new`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RandomMode {
    Uuid,
    Word,
}

impl RandomMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RandomMode::Uuid => "uuid",
            RandomMode::Word => "word",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Enabled {
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Deleted {
    pub deleted: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Updated {
    pub updated: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub msg: String,
}

macro_rules! api_object {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(impl ApiObject for $ty {
            const NAME: &'static str = $name;
        })*
    };
}

api_object! {
    Alias => "Alias",
    AliasArray => "AliasArray",
    ActivityArray => "ActivityArray",
    Contact => "Contact",
    ContactArray => "ContactArray",
    Mailbox => "Mailbox",
    MailboxArray => "MailboxArray",
    UserInfo => "UserInfo",
    UserLogin => "UserLogin",
    Enabled => "Enabled",
    Deleted => "Deleted",
    Updated => "Updated",
    OkResponse => "OkResponse",
    Message => "Message",
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_decodes_with_missing_optionals() {
        let alias: Alias = serde_json::from_str(
            r#"{"id":7,"email":"a@sl.local","enabled":true,"creation_timestamp":1600000000}"#,
        )
        .unwrap();
        assert_eq!(alias.id, 7);
        assert!(alias.name.is_none());
        assert!(alias.mailboxes.is_empty());
        assert_eq!(alias.nb_forward, 0);
    }

    #[test]
    fn activity_action_is_lowercase() {
        let activity: AliasActivity = serde_json::from_str(
            r#"{"action":"block","from":"x@a.com","to":"b@sl.local","timestamp":5}"#,
        )
        .unwrap();
        assert_eq!(activity.action, ActivityAction::Block);
    }

    #[test]
    fn login_without_api_key_means_mfa() {
        let login: UserLogin = serde_json::from_str(
            r#"{"api_key":null,"email":"john@x.com","name":"John","mfa_enabled":true,"mfa_key":"tok"}"#,
        )
        .unwrap();
        assert!(login.api_key.is_none());
        assert_eq!(login.mfa_key.as_deref(), Some("tok"));
    }

    #[test]
    fn mailbox_verified_defaults_to_true() {
        let mailbox: Mailbox = serde_json::from_str(
            r#"{"id":1,"email":"me@x.com","default":true,"creation_timestamp":1}"#,
        )
        .unwrap();
        assert!(mailbox.verified);
    }
}
