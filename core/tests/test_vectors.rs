//! Verify request building and status mapping against JSON test vectors
//! stored in `test-vectors/`.
//!
//! The same files can drive a host-language test suite through the FFI
//! crate. Bodies are compared as parsed JSON so field order never matters.

use serde_json::Value;
use simplelogin_core::client::parse_response;
use simplelogin_core::types::{Enabled, MailboxArray};
use simplelogin_core::{
    ApiKey, Credentials, Endpoint, EndpointKind, HttpMethod, HttpResponse, RandomMode, SlError,
};
use url::Url;

const BASE_URL: &str = "https://app.simplelogin.io";

fn base_url() -> Url {
    Url::parse(BASE_URL).unwrap()
}

fn credentials() -> Credentials {
    Credentials::new(base_url(), ApiKey::new("vector-key"))
}

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn parse_kind(s: &str) -> EndpointKind {
    match s {
        "aliases" => EndpointKind::Aliases,
        "alias_activities" => EndpointKind::AliasActivities,
        "contacts" => EndpointKind::Contacts,
        "create_contact" => EndpointKind::CreateContact,
        "login" => EndpointKind::Login,
        "mfa" => EndpointKind::Mfa,
        "register" => EndpointKind::Register,
        "mailboxes" => EndpointKind::Mailboxes,
        "create_mailbox" => EndpointKind::CreateMailbox,
        "make_default_mailbox" => EndpointKind::MakeDefaultMailbox,
        "delete_mailbox" => EndpointKind::DeleteMailbox,
        "update_alias_mailboxes" => EndpointKind::UpdateAliasMailboxes,
        "update_alias_name" => EndpointKind::UpdateAliasName,
        "update_alias_note" => EndpointKind::UpdateAliasNote,
        "toggle_alias" => EndpointKind::ToggleAlias,
        "delete_alias" => EndpointKind::DeleteAlias,
        "random_alias" => EndpointKind::RandomAlias,
        "user_info" => EndpointKind::UserInfo,
        other => panic!("unknown endpoint kind: {other}"),
    }
}

fn string(v: &Value, field: &str) -> String {
    v[field].as_str().unwrap().to_string()
}

fn optional(v: &Value, field: &str) -> Option<String> {
    v[field].as_str().map(str::to_string)
}

fn int(v: &Value, field: &str) -> i64 {
    v[field].as_i64().unwrap()
}

fn page(v: &Value) -> u32 {
    v["page"].as_u64().unwrap() as u32
}

/// Build the endpoint a vector describes.
fn endpoint(v: &Value) -> Endpoint {
    let credentials = credentials();
    match parse_kind(v["kind"].as_str().unwrap()) {
        EndpointKind::Aliases => Endpoint::Aliases {
            credentials,
            page: page(v),
            search_term: optional(v, "search_term"),
        },
        EndpointKind::AliasActivities => Endpoint::AliasActivities {
            credentials,
            alias_id: int(v, "alias_id"),
            page: page(v),
        },
        EndpointKind::Contacts => Endpoint::Contacts {
            credentials,
            alias_id: int(v, "alias_id"),
            page: page(v),
        },
        EndpointKind::CreateContact => Endpoint::CreateContact {
            credentials,
            alias_id: int(v, "alias_id"),
            contact: string(v, "contact"),
        },
        EndpointKind::Login => Endpoint::Login {
            base_url: base_url(),
            email: string(v, "email"),
            password: string(v, "password"),
            device: string(v, "device"),
        },
        EndpointKind::Mfa => Endpoint::Mfa {
            base_url: base_url(),
            mfa_token: string(v, "mfa_token"),
            mfa_key: string(v, "mfa_key"),
            device: string(v, "device"),
        },
        EndpointKind::Register => Endpoint::Register {
            base_url: base_url(),
            email: string(v, "email"),
            password: string(v, "password"),
        },
        EndpointKind::Mailboxes => Endpoint::Mailboxes { credentials },
        EndpointKind::CreateMailbox => Endpoint::CreateMailbox {
            credentials,
            email: string(v, "email"),
        },
        EndpointKind::MakeDefaultMailbox => Endpoint::MakeDefaultMailbox {
            credentials,
            mailbox_id: int(v, "mailbox_id"),
        },
        EndpointKind::DeleteMailbox => Endpoint::DeleteMailbox {
            credentials,
            mailbox_id: int(v, "mailbox_id"),
        },
        EndpointKind::UpdateAliasMailboxes => Endpoint::UpdateAliasMailboxes {
            credentials,
            alias_id: int(v, "alias_id"),
            mailbox_ids: serde_json::from_value(v["mailbox_ids"].clone()).unwrap(),
        },
        EndpointKind::UpdateAliasName => Endpoint::UpdateAliasName {
            credentials,
            alias_id: int(v, "alias_id"),
            name: optional(v, "name"),
        },
        EndpointKind::UpdateAliasNote => Endpoint::UpdateAliasNote {
            credentials,
            alias_id: int(v, "alias_id"),
            note: optional(v, "note"),
        },
        EndpointKind::ToggleAlias => Endpoint::ToggleAlias {
            credentials,
            alias_id: int(v, "alias_id"),
        },
        EndpointKind::DeleteAlias => Endpoint::DeleteAlias {
            credentials,
            alias_id: int(v, "alias_id"),
        },
        EndpointKind::RandomAlias => Endpoint::RandomAlias {
            credentials,
            mode: serde_json::from_value::<RandomMode>(v["mode"].clone()).unwrap(),
            note: optional(v, "note"),
        },
        EndpointKind::UserInfo => Endpoint::UserInfo { credentials },
    }
}

/// Build the error a vector expects from `[variant, payload]`.
fn expected_error(v: &Value) -> SlError {
    let payload = || v[1].as_str().unwrap().to_string();
    match v[0].as_str().unwrap() {
        "NoData" => SlError::NoData,
        "FailToParseObject" => SlError::FailToParseObject(payload()),
        "EmailOrPasswordIncorrect" => SlError::EmailOrPasswordIncorrect,
        "InvalidApiKey" => SlError::InvalidApiKey,
        "DuplicatedAlias" => SlError::DuplicatedAlias,
        "DuplicatedContact" => SlError::DuplicatedContact,
        "ReactivationNeeded" => SlError::ReactivationNeeded,
        "InternalServerError" => SlError::InternalServerError,
        "BadRequest" => SlError::BadRequest(payload()),
        "UnknownError" => SlError::UnknownError(payload()),
        other => panic!("unknown error variant: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn endpoint_test_vectors() {
    let raw = include_str!("../../test-vectors/endpoints.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let expected = &case["expected_request"];
        let endpoint = endpoint(&case["endpoint"]);

        let req = endpoint.build();
        assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, format!("{BASE_URL}{}", expected["url"].as_str().unwrap()), "{name}: url");

        let expected_headers: Vec<(String, String)> =
            serde_json::from_value(expected["headers"].clone()).unwrap();
        assert_eq!(req.headers, expected_headers, "{name}: headers");

        let body: Value = req
            .body
            .as_deref()
            .map(|b| serde_json::from_str(b).unwrap())
            .unwrap_or(Value::Null);
        assert_eq!(body, expected["body"], "{name}: body");

        assert_eq!(req, endpoint.build(), "{name}: deterministic");
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn error_test_vectors() {
    let raw = include_str!("../../test-vectors/errors.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let kind = parse_kind(case["kind"].as_str().unwrap());
        let response = HttpResponse::new(case["status"].as_u64().unwrap() as u16, case["body"].as_str().unwrap());
        let expected = expected_error(&case["expected_error"]);

        // Every vector expects a failure; pick the body type the kind decodes.
        let err = match kind {
            EndpointKind::ToggleAlias => parse_response::<Enabled>(kind, response).unwrap_err(),
            _ => parse_response::<MailboxArray>(kind, response).unwrap_err(),
        };
        assert_eq!(err, expected, "{name}");
    }
}
