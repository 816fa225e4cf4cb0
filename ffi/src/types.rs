//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! enums with explicit discriminants. Parsed payloads cross the boundary as
//! JSON text so the host decodes them with its own JSON library.

use std::ffi::CString;
use std::os::raw::c_char;

use simplelogin_core::{EndpointKind, HttpMethod, RandomMode, Session, SlError};

/// Opaque handle to a `Session`. C callers receive a pointer to this and
/// pass it back into every `sl_build_*` function.
pub struct FfiSession {
    pub(crate) inner: Session,
}

/// Copy `s` into a C string. Interior NULs cannot be represented and are
/// dropped.
pub(crate) fn to_c_string(s: String) -> *mut c_char {
    let bytes: Vec<u8> = s.into_bytes().into_iter().filter(|b| *b != 0).collect();
    CString::new(bytes).unwrap_or_default().into_raw()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

/// Which API call a request belongs to. Passed back to
/// `sl_parse_response` so the right status mapping and body type apply.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiEndpointKind {
    Aliases = 0,
    AliasActivities = 1,
    Contacts = 2,
    CreateContact = 3,
    Login = 4,
    Mfa = 5,
    Register = 6,
    Mailboxes = 7,
    CreateMailbox = 8,
    MakeDefaultMailbox = 9,
    DeleteMailbox = 10,
    UpdateAliasMailboxes = 11,
    UpdateAliasName = 12,
    UpdateAliasNote = 13,
    ToggleAlias = 14,
    DeleteAlias = 15,
    RandomAlias = 16,
    UserInfo = 17,
}

impl From<EndpointKind> for FfiEndpointKind {
    fn from(kind: EndpointKind) -> Self {
        match kind {
            EndpointKind::Aliases => FfiEndpointKind::Aliases,
            EndpointKind::AliasActivities => FfiEndpointKind::AliasActivities,
            EndpointKind::Contacts => FfiEndpointKind::Contacts,
            EndpointKind::CreateContact => FfiEndpointKind::CreateContact,
            EndpointKind::Login => FfiEndpointKind::Login,
            EndpointKind::Mfa => FfiEndpointKind::Mfa,
            EndpointKind::Register => FfiEndpointKind::Register,
            EndpointKind::Mailboxes => FfiEndpointKind::Mailboxes,
            EndpointKind::CreateMailbox => FfiEndpointKind::CreateMailbox,
            EndpointKind::MakeDefaultMailbox => FfiEndpointKind::MakeDefaultMailbox,
            EndpointKind::DeleteMailbox => FfiEndpointKind::DeleteMailbox,
            EndpointKind::UpdateAliasMailboxes => FfiEndpointKind::UpdateAliasMailboxes,
            EndpointKind::UpdateAliasName => FfiEndpointKind::UpdateAliasName,
            EndpointKind::UpdateAliasNote => FfiEndpointKind::UpdateAliasNote,
            EndpointKind::ToggleAlias => FfiEndpointKind::ToggleAlias,
            EndpointKind::DeleteAlias => FfiEndpointKind::DeleteAlias,
            EndpointKind::RandomAlias => FfiEndpointKind::RandomAlias,
            EndpointKind::UserInfo => FfiEndpointKind::UserInfo,
        }
    }
}

impl From<FfiEndpointKind> for EndpointKind {
    fn from(kind: FfiEndpointKind) -> Self {
        match kind {
            FfiEndpointKind::Aliases => EndpointKind::Aliases,
            FfiEndpointKind::AliasActivities => EndpointKind::AliasActivities,
            FfiEndpointKind::Contacts => EndpointKind::Contacts,
            FfiEndpointKind::CreateContact => EndpointKind::CreateContact,
            FfiEndpointKind::Login => EndpointKind::Login,
            FfiEndpointKind::Mfa => EndpointKind::Mfa,
            FfiEndpointKind::Register => EndpointKind::Register,
            FfiEndpointKind::Mailboxes => EndpointKind::Mailboxes,
            FfiEndpointKind::CreateMailbox => EndpointKind::CreateMailbox,
            FfiEndpointKind::MakeDefaultMailbox => EndpointKind::MakeDefaultMailbox,
            FfiEndpointKind::DeleteMailbox => EndpointKind::DeleteMailbox,
            FfiEndpointKind::UpdateAliasMailboxes => EndpointKind::UpdateAliasMailboxes,
            FfiEndpointKind::UpdateAliasName => EndpointKind::UpdateAliasName,
            FfiEndpointKind::UpdateAliasNote => EndpointKind::UpdateAliasNote,
            FfiEndpointKind::ToggleAlias => EndpointKind::ToggleAlias,
            FfiEndpointKind::DeleteAlias => EndpointKind::DeleteAlias,
            FfiEndpointKind::RandomAlias => EndpointKind::RandomAlias,
            FfiEndpointKind::UserInfo => EndpointKind::UserInfo,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiRandomMode {
    Uuid = 0,
    Word = 1,
}

impl From<FfiRandomMode> for RandomMode {
    fn from(mode: FfiRandomMode) -> Self {
        match mode {
            FfiRandomMode::Uuid => RandomMode::Uuid,
            FfiRandomMode::Word => RandomMode::Word,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `sl_build_*` functions. The C caller executes the request and
/// passes the response, with `kind`, back through `sl_parse_response`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub kind: FfiEndpointKind,
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(kind: EndpointKind, req: simplelogin_core::HttpRequest) -> *mut Self {
        let url = to_c_string(req.url);
        let body = match req.body {
            Some(b) => to_c_string(b),
            None => std::ptr::null_mut(),
        };

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: to_c_string(k),
                    value: to_c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            kind: kind.into(),
            method: req.method.into(),
            url,
            headers,
            headers_len,
            body,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing a request,
/// then passes a pointer to `sl_parse_response`. The FFI layer reads but
/// does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiSlResult`. One per client error, plus the
/// two FFI-only failures.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    NoData = 1,
    FailToSerializeJsonData = 2,
    FailToParseObject = 3,
    FailToDelete = 4,
    EmailOrPasswordIncorrect = 5,
    InvalidApiKey = 6,
    DuplicatedAlias = 7,
    DuplicatedContact = 8,
    ReactivationNeeded = 9,
    InternalServerError = 10,
    BadRequest = 11,
    UnknownError = 12,
    Panic = 13,
    NullArg = 14,
}

impl From<&SlError> for FfiErrorCode {
    fn from(err: &SlError) -> Self {
        match err {
            SlError::NoData => FfiErrorCode::NoData,
            SlError::FailToSerializeJsonData => FfiErrorCode::FailToSerializeJsonData,
            SlError::FailToParseObject(_) => FfiErrorCode::FailToParseObject,
            SlError::FailToDelete(_) => FfiErrorCode::FailToDelete,
            SlError::EmailOrPasswordIncorrect => FfiErrorCode::EmailOrPasswordIncorrect,
            SlError::InvalidApiKey => FfiErrorCode::InvalidApiKey,
            SlError::DuplicatedAlias => FfiErrorCode::DuplicatedAlias,
            SlError::DuplicatedContact => FfiErrorCode::DuplicatedContact,
            SlError::ReactivationNeeded => FfiErrorCode::ReactivationNeeded,
            SlError::InternalServerError => FfiErrorCode::InternalServerError,
            SlError::BadRequest(_) => FfiErrorCode::BadRequest,
            SlError::UnknownError(_) => FfiErrorCode::UnknownError,
        }
    }
}

/// Result envelope for `sl_parse_response`.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `payload`
/// is the decoded body re-encoded as JSON. On failure `error_code` names
/// the error, `error_message` is a human-readable C string, and `payload`
/// is null.
#[repr(C)]
pub struct FfiSlResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub payload: *mut c_char,
}

impl FfiSlResult {
    pub(crate) fn ok(http_status: u16, payload: String) -> *mut Self {
        Box::into_raw(Box::new(FfiSlResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status,
            payload: to_c_string(payload),
        }))
    }

    pub(crate) fn from_error(http_status: u16, err: SlError) -> *mut Self {
        Box::into_raw(Box::new(FfiSlResult {
            error_code: FfiErrorCode::from(&err),
            error_message: to_c_string(err.to_string()),
            http_status,
            payload: std::ptr::null_mut(),
        }))
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, format!("null argument: {name}"))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, msg.to_string())
    }

    fn failure(error_code: FfiErrorCode, msg: String) -> *mut Self {
        Box::into_raw(Box::new(FfiSlResult {
            error_code,
            error_message: to_c_string(msg),
            http_status: 0,
            payload: std::ptr::null_mut(),
        }))
    }
}
