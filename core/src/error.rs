//! Error taxonomy for the SimpleLogin client core.
//!
//! # Design
//! The set is closed: every transport, decode and server failure is mapped
//! into one of these variants at the client boundary, so view-models never
//! see raw transport errors. Each variant renders a fixed message suitable
//! for showing to the user.

use thiserror::Error;

/// Errors surfaced by `SlClient` and published by view-models.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlError {
    /// No response at all: offline, timeout, connection refused.
    #[error("Server isn't responding. Please try again later.")]
    NoData,

    #[error("Failed to serialize JSON data")]
    FailToSerializeJsonData,

    /// A 2xx body could not be decoded into the named object.
    #[error("Failed to parse {0}")]
    FailToParseObject(String),

    /// The server answered a delete request without confirming it.
    #[error("Failed to delete {0}")]
    FailToDelete(String),

    #[error("Email or password incorrect")]
    EmailOrPasswordIncorrect,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Alias is duplicated")]
    DuplicatedAlias,

    #[error("Contact already created")]
    DuplicatedContact,

    #[error("Reactivation needed")]
    ReactivationNeeded,

    #[error("Internal server error")]
    InternalServerError,

    /// Non-2xx with a server-provided `{"error": ...}` message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unknown error: {0}")]
    UnknownError(String),
}

impl SlError {
    /// Analytics payload: `{"error": <message>}`.
    pub fn to_parameter(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.to_string() })
    }
}
