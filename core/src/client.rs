//! Stateless API client for SimpleLogin.
//!
//! # Design
//! `SlClient` owns only a `Transport` and keeps no per-call state, so one
//! instance behind an `Arc` serves every view-model concurrently. Each call
//! builds its request from an `Endpoint`, runs it through the transport and
//! hands the response to `parse_response`, which is also public so hosts
//! doing their own I/O get the exact same status mapping. Nothing is cached
//! here; caching belongs to the view-models.

use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::endpoint::{Endpoint, EndpointKind};
use crate::error::SlError;
use crate::http::HttpResponse;
use crate::session::Credentials;
use crate::transport::{ReqwestTransport, Transport, TransportError};
use crate::types::{
    ActivityArray, Alias, AliasActivity, AliasArray, AliasId, ApiObject, Contact, ContactArray,
    Deleted, Enabled, Mailbox, MailboxArray, MailboxId, Message, OkResponse, RandomMode, Updated,
    UserInfo, UserLogin,
};

#[derive(Debug, Clone)]
pub struct SlClient<T = ReqwestTransport> {
    transport: T,
}

impl SlClient<ReqwestTransport> {
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        Ok(Self::new(ReqwestTransport::from_config(config)?))
    }
}

impl<T: Transport> SlClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Execute `endpoint` and decode the body as `R`.
    pub async fn send<R: ApiObject>(&self, endpoint: &Endpoint) -> Result<R, SlError> {
        let kind = endpoint.kind();
        let request = endpoint.build();
        debug!(?kind, method = %request.method, url = %request.url, "sending request");

        let response = self.transport.execute(request).await.map_err(|err| {
            warn!(?kind, error = %err, "request failed before a response");
            SlError::NoData
        })?;

        parse_response(kind, response)
    }

    pub async fn aliases(
        &self,
        credentials: &Credentials,
        page: u32,
        search_term: Option<&str>,
    ) -> Result<Vec<Alias>, SlError> {
        let endpoint = Endpoint::Aliases {
            credentials: credentials.clone(),
            page,
            search_term: search_term.map(str::to_string),
        };
        Ok(self.send::<AliasArray>(&endpoint).await?.aliases)
    }

    pub async fn alias_activities(
        &self,
        credentials: &Credentials,
        alias_id: AliasId,
        page: u32,
    ) -> Result<Vec<AliasActivity>, SlError> {
        let endpoint = Endpoint::AliasActivities {
            credentials: credentials.clone(),
            alias_id,
            page,
        };
        Ok(self.send::<ActivityArray>(&endpoint).await?.activities)
    }

    pub async fn contacts(
        &self,
        credentials: &Credentials,
        alias_id: AliasId,
        page: u32,
    ) -> Result<Vec<Contact>, SlError> {
        let endpoint = Endpoint::Contacts {
            credentials: credentials.clone(),
            alias_id,
            page,
        };
        Ok(self.send::<ContactArray>(&endpoint).await?.contacts)
    }

    pub async fn create_contact(
        &self,
        credentials: &Credentials,
        alias_id: AliasId,
        contact: &str,
    ) -> Result<Contact, SlError> {
        let endpoint = Endpoint::CreateContact {
            credentials: credentials.clone(),
            alias_id,
            contact: contact.to_string(),
        };
        self.send(&endpoint).await
    }

    pub async fn login(
        &self,
        base_url: &Url,
        email: &str,
        password: &str,
        device: &str,
    ) -> Result<UserLogin, SlError> {
        let endpoint = Endpoint::Login {
            base_url: base_url.clone(),
            email: email.to_string(),
            password: password.to_string(),
            device: device.to_string(),
        };
        self.send(&endpoint).await
    }

    pub async fn mfa(
        &self,
        base_url: &Url,
        mfa_token: &str,
        mfa_key: &str,
        device: &str,
    ) -> Result<UserLogin, SlError> {
        let endpoint = Endpoint::Mfa {
            base_url: base_url.clone(),
            mfa_token: mfa_token.to_string(),
            mfa_key: mfa_key.to_string(),
            device: device.to_string(),
        };
        self.send(&endpoint).await
    }

    /// Returns the server's confirmation message.
    pub async fn register(
        &self,
        base_url: &Url,
        email: &str,
        password: &str,
    ) -> Result<String, SlError> {
        let endpoint = Endpoint::Register {
            base_url: base_url.clone(),
            email: email.to_string(),
            password: password.to_string(),
        };
        Ok(self.send::<Message>(&endpoint).await?.msg)
    }

    pub async fn mailboxes(&self, credentials: &Credentials) -> Result<Vec<Mailbox>, SlError> {
        let endpoint = Endpoint::Mailboxes {
            credentials: credentials.clone(),
        };
        Ok(self.send::<MailboxArray>(&endpoint).await?.mailboxes)
    }

    pub async fn create_mailbox(
        &self,
        credentials: &Credentials,
        email: &str,
    ) -> Result<Mailbox, SlError> {
        let endpoint = Endpoint::CreateMailbox {
            credentials: credentials.clone(),
            email: email.to_string(),
        };
        self.send(&endpoint).await
    }

    pub async fn make_default_mailbox(
        &self,
        credentials: &Credentials,
        mailbox_id: MailboxId,
    ) -> Result<bool, SlError> {
        let endpoint = Endpoint::MakeDefaultMailbox {
            credentials: credentials.clone(),
            mailbox_id,
        };
        Ok(self.send::<Updated>(&endpoint).await?.updated)
    }

    pub async fn delete_mailbox(
        &self,
        credentials: &Credentials,
        mailbox_id: MailboxId,
    ) -> Result<(), SlError> {
        let endpoint = Endpoint::DeleteMailbox {
            credentials: credentials.clone(),
            mailbox_id,
        };
        confirm_deleted(self.send::<Deleted>(&endpoint).await?, "mailbox")
    }

    pub async fn update_alias_mailboxes(
        &self,
        credentials: &Credentials,
        alias_id: AliasId,
        mailbox_ids: Vec<MailboxId>,
    ) -> Result<(), SlError> {
        let endpoint = Endpoint::UpdateAliasMailboxes {
            credentials: credentials.clone(),
            alias_id,
            mailbox_ids,
        };
        self.send::<OkResponse>(&endpoint).await.map(|_| ())
    }

    pub async fn update_alias_name(
        &self,
        credentials: &Credentials,
        alias_id: AliasId,
        name: Option<String>,
    ) -> Result<(), SlError> {
        let endpoint = Endpoint::UpdateAliasName {
            credentials: credentials.clone(),
            alias_id,
            name,
        };
        self.send::<OkResponse>(&endpoint).await.map(|_| ())
    }

    pub async fn update_alias_note(
        &self,
        credentials: &Credentials,
        alias_id: AliasId,
        note: Option<String>,
    ) -> Result<(), SlError> {
        let endpoint = Endpoint::UpdateAliasNote {
            credentials: credentials.clone(),
            alias_id,
            note,
        };
        self.send::<OkResponse>(&endpoint).await.map(|_| ())
    }

    /// Returns the alias's new `enabled` state.
    pub async fn toggle_alias(
        &self,
        credentials: &Credentials,
        alias_id: AliasId,
    ) -> Result<bool, SlError> {
        let endpoint = Endpoint::ToggleAlias {
            credentials: credentials.clone(),
            alias_id,
        };
        Ok(self.send::<Enabled>(&endpoint).await?.enabled)
    }

    pub async fn delete_alias(
        &self,
        credentials: &Credentials,
        alias_id: AliasId,
    ) -> Result<(), SlError> {
        let endpoint = Endpoint::DeleteAlias {
            credentials: credentials.clone(),
            alias_id,
        };
        confirm_deleted(self.send::<Deleted>(&endpoint).await?, "alias")
    }

    pub async fn random_alias(
        &self,
        credentials: &Credentials,
        mode: RandomMode,
        note: Option<String>,
    ) -> Result<Alias, SlError> {
        let endpoint = Endpoint::RandomAlias {
            credentials: credentials.clone(),
            mode,
            note,
        };
        self.send(&endpoint).await
    }

    pub async fn user_info(&self, credentials: &Credentials) -> Result<UserInfo, SlError> {
        let endpoint = Endpoint::UserInfo {
            credentials: credentials.clone(),
        };
        self.send(&endpoint).await
    }
}

fn confirm_deleted(response: Deleted, object: &str) -> Result<(), SlError> {
    if response.deleted {
        Ok(())
    } else {
        Err(SlError::FailToDelete(object.to_string()))
    }
}

/// Decode a response for an endpoint of `kind`.
///
/// 2xx bodies decode as `R`; anything else goes through `map_status`.
pub fn parse_response<R: ApiObject>(kind: EndpointKind, response: HttpResponse) -> Result<R, SlError> {
    if !response.is_success() {
        let err = map_status(kind, &response);
        debug!(?kind, status = response.status, error = %err, "request rejected");
        return Err(err);
    }
    serde_json::from_str(&response.body).map_err(|err| {
        warn!(?kind, object = R::NAME, error = %err, "response did not decode");
        SlError::FailToParseObject(R::NAME.to_string())
    })
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Map a non-2xx response to the error taxonomy.
pub fn map_status(kind: EndpointKind, response: &HttpResponse) -> SlError {
    let status = response.status;
    let is_login = matches!(kind, EndpointKind::Login | EndpointKind::Mfa);

    match status {
        401 if is_login => return SlError::EmailOrPasswordIncorrect,
        401 if kind.is_authenticated() => return SlError::InvalidApiKey,
        400 if kind == EndpointKind::Login => return SlError::EmailOrPasswordIncorrect,
        422 if kind == EndpointKind::Login => return SlError::ReactivationNeeded,
        409 if kind == EndpointKind::RandomAlias => return SlError::DuplicatedAlias,
        409 if kind == EndpointKind::CreateContact => return SlError::DuplicatedContact,
        _ => {}
    }

    let body = response.body.trim();
    if (500..600).contains(&status) {
        if body.is_empty() || serde_json::from_str::<serde_json::Value>(body).is_ok() {
            return SlError::InternalServerError;
        }
        return SlError::UnknownError(body.to_string());
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { error }) => SlError::BadRequest(error),
        Err(_) if body.is_empty() => SlError::UnknownError(format!("HTTP {status}")),
        Err(_) => SlError::UnknownError(body.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse::new(status, body)
    }

    #[test]
    fn parse_aliases_success() {
        let body = r#"{"aliases":[{"id":1,"email":"a@sl.local","enabled":true,"creation_timestamp":10}]}"#;
        let aliases: AliasArray = parse_response(EndpointKind::Aliases, response(200, body)).unwrap();
        assert_eq!(aliases.aliases.len(), 1);
        assert_eq!(aliases.aliases[0].email, "a@sl.local");
    }

    #[test]
    fn parse_bad_json_names_target() {
        let err = parse_response::<MailboxArray>(EndpointKind::Mailboxes, response(200, "nope"))
            .unwrap_err();
        assert_eq!(err, SlError::FailToParseObject("MailboxArray".to_string()));
    }

    #[test]
    fn created_status_is_success() {
        let body = r#"{"id":3,"email":"new@x.com","default":false,"creation_timestamp":1}"#;
        let mailbox: Mailbox =
            parse_response(EndpointKind::CreateMailbox, response(201, body)).unwrap();
        assert_eq!(mailbox.id, 3);
    }

    #[test]
    fn conflict_on_alias_creation_is_duplicated_alias() {
        let err = map_status(EndpointKind::RandomAlias, &response(409, r#"{"error":"dup"}"#));
        assert_eq!(err, SlError::DuplicatedAlias);
    }

    #[test]
    fn conflict_on_contact_creation_is_duplicated_contact() {
        let err = map_status(EndpointKind::CreateContact, &response(409, ""));
        assert_eq!(err, SlError::DuplicatedContact);
    }

    #[test]
    fn server_error_with_json_is_internal() {
        let err = map_status(EndpointKind::Aliases, &response(503, r#"{"error":"down"}"#));
        assert_eq!(err, SlError::InternalServerError);
        let err = map_status(EndpointKind::Aliases, &response(500, ""));
        assert_eq!(err, SlError::InternalServerError);
    }

    #[test]
    fn server_error_with_text_is_unknown() {
        let err = map_status(EndpointKind::UserInfo, &response(500, "Bad Gateway\n"));
        assert_eq!(err, SlError::UnknownError("Bad Gateway".to_string()));
    }

    #[test]
    fn unauthorized_depends_on_endpoint() {
        assert_eq!(
            map_status(EndpointKind::Login, &response(401, "")),
            SlError::EmailOrPasswordIncorrect
        );
        assert_eq!(
            map_status(EndpointKind::Mailboxes, &response(401, "")),
            SlError::InvalidApiKey
        );
    }

    #[test]
    fn login_specific_statuses() {
        assert_eq!(
            map_status(EndpointKind::Login, &response(400, r#"{"error":"x"}"#)),
            SlError::EmailOrPasswordIncorrect
        );
        assert_eq!(
            map_status(EndpointKind::Login, &response(422, "")),
            SlError::ReactivationNeeded
        );
    }

    #[test]
    fn other_client_errors_carry_server_message() {
        assert_eq!(
            map_status(EndpointKind::UpdateAliasName, &response(400, r#"{"error":"too long"}"#)),
            SlError::BadRequest("too long".to_string())
        );
        assert_eq!(
            map_status(EndpointKind::Register, &response(400, "<html>")),
            SlError::UnknownError("<html>".to_string())
        );
        assert_eq!(
            map_status(EndpointKind::DeleteAlias, &response(404, "")),
            SlError::UnknownError("HTTP 404".to_string())
        );
    }

    #[test]
    fn unconfirmed_delete_fails() {
        assert_eq!(
            confirm_deleted(Deleted { deleted: false }, "alias"),
            Err(SlError::FailToDelete("alias".to_string()))
        );
        assert!(confirm_deleted(Deleted { deleted: true }, "alias").is_ok());
    }
}
