//! C-ABI wrapper around `simplelogin-core`.
//!
//! # Overview
//! Exposes request building and response parsing for every SimpleLogin
//! endpoint through `extern "C"` functions, so a host app executes the HTTP
//! round-trip itself and never links Rust's async runtime.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - One `sl_build_*` per endpoint; a single `sl_parse_response` keyed by
//!   `FfiEndpointKind` decodes any response into an `FfiSlResult` whose
//!   payload is JSON.
//! - An `FfiSession` holds the base URL and API key. Authenticated builders
//!   return null while it is signed out.
//! - The C caller owns all returned pointers and must call the matching
//!   `sl_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::Serialize;
use simplelogin_core::client::parse_response;
use simplelogin_core::types::{
    ActivityArray, Alias, AliasArray, ApiObject, Contact, ContactArray, Deleted, Enabled, Mailbox,
    MailboxArray, Message, OkResponse, Updated, UserInfo, UserLogin,
};
use simplelogin_core::{ApiKey, Credentials, Endpoint, EndpointKind, HttpResponse, Session, SlError};
use url::Url;

use types::*;

/// Borrow a C string as UTF-8. Null or invalid UTF-8 yields `None`.
fn c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

fn owned(ptr: *const c_char) -> Option<String> {
    c_str(ptr).map(str::to_string)
}

// ---------------------------------------------------------------------------
// Session lifecycle
// ---------------------------------------------------------------------------

/// Create a signed-out session bound to `base_url`.
///
/// Returns null if `base_url` is null or not an absolute URL.
/// The caller must free the returned pointer with `sl_session_free`.
#[unsafe(no_mangle)]
pub extern "C" fn sl_session_new(base_url: *const c_char) -> *mut FfiSession {
    catch_unwind(|| {
        let Some(url) = c_str(base_url).and_then(|s| Url::parse(s).ok()) else {
            return std::ptr::null_mut();
        };
        Box::into_raw(Box::new(FfiSession {
            inner: Session::new(url),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Store `api_key` in the session, or sign out when `api_key` is null.
#[unsafe(no_mangle)]
pub extern "C" fn sl_session_set_api_key(session: *const FfiSession, api_key: *const c_char) {
    if session.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let session = unsafe { &*session };
        match c_str(api_key) {
            Some(key) => session.inner.sign_in(ApiKey::new(key)),
            None => session.inner.sign_out(),
        }
    }));
}

#[unsafe(no_mangle)]
pub extern "C" fn sl_session_is_signed_in(session: *const FfiSession) -> bool {
    if session.is_null() {
        return false;
    }
    catch_unwind(AssertUnwindSafe(|| unsafe { &*session }.inner.is_signed_in())).unwrap_or(false)
}

/// Free a session created by `sl_session_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn sl_session_free(session: *mut FfiSession) {
    if !session.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(session) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build an authenticated request. Null when `session` is null, signed out,
/// or `endpoint` rejects its arguments.
fn build_authenticated(
    session: *const FfiSession,
    endpoint: impl FnOnce(Credentials) -> Option<Endpoint>,
) -> *mut FfiHttpRequest {
    if session.is_null() {
        return std::ptr::null_mut();
    }
    catch_unwind(AssertUnwindSafe(|| {
        let session = unsafe { &*session };
        session
            .inner
            .credentials()
            .and_then(endpoint)
            .map(|endpoint| FfiHttpRequest::from_core(endpoint.kind(), endpoint.build()))
            .unwrap_or(std::ptr::null_mut())
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Build a request that only needs the base URL (login, MFA, register).
fn build_anonymous(
    session: *const FfiSession,
    endpoint: impl FnOnce(Url) -> Option<Endpoint>,
) -> *mut FfiHttpRequest {
    if session.is_null() {
        return std::ptr::null_mut();
    }
    catch_unwind(AssertUnwindSafe(|| {
        let session = unsafe { &*session };
        endpoint(session.inner.base_url())
            .map(|endpoint| FfiHttpRequest::from_core(endpoint.kind(), endpoint.build()))
            .unwrap_or(std::ptr::null_mut())
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Page `page` of aliases. A non-null, non-empty `search_term` searches.
#[unsafe(no_mangle)]
pub extern "C" fn sl_build_aliases(
    session: *const FfiSession,
    page: u32,
    search_term: *const c_char,
) -> *mut FfiHttpRequest {
    build_authenticated(session, |credentials| {
        Some(Endpoint::Aliases {
            credentials,
            page,
            search_term: owned(search_term),
        })
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn sl_build_alias_activities(
    session: *const FfiSession,
    alias_id: i64,
    page: u32,
) -> *mut FfiHttpRequest {
    build_authenticated(session, |credentials| {
        Some(Endpoint::AliasActivities {
            credentials,
            alias_id,
            page,
        })
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn sl_build_contacts(
    session: *const FfiSession,
    alias_id: i64,
    page: u32,
) -> *mut FfiHttpRequest {
    build_authenticated(session, |credentials| {
        Some(Endpoint::Contacts {
            credentials,
            alias_id,
            page,
        })
    })
}

/// Returns null if `contact` is null.
#[unsafe(no_mangle)]
pub extern "C" fn sl_build_create_contact(
    session: *const FfiSession,
    alias_id: i64,
    contact: *const c_char,
) -> *mut FfiHttpRequest {
    build_authenticated(session, |credentials| {
        Some(Endpoint::CreateContact {
            credentials,
            alias_id,
            contact: owned(contact)?,
        })
    })
}

/// Returns null if any string argument is null.
#[unsafe(no_mangle)]
pub extern "C" fn sl_build_login(
    session: *const FfiSession,
    email: *const c_char,
    password: *const c_char,
    device: *const c_char,
) -> *mut FfiHttpRequest {
    build_anonymous(session, |base_url| {
        Some(Endpoint::Login {
            base_url,
            email: owned(email)?,
            password: owned(password)?,
            device: owned(device)?,
        })
    })
}

/// Returns null if any string argument is null.
#[unsafe(no_mangle)]
pub extern "C" fn sl_build_mfa(
    session: *const FfiSession,
    mfa_token: *const c_char,
    mfa_key: *const c_char,
    device: *const c_char,
) -> *mut FfiHttpRequest {
    build_anonymous(session, |base_url| {
        Some(Endpoint::Mfa {
            base_url,
            mfa_token: owned(mfa_token)?,
            mfa_key: owned(mfa_key)?,
            device: owned(device)?,
        })
    })
}

/// Returns null if any string argument is null.
#[unsafe(no_mangle)]
pub extern "C" fn sl_build_register(
    session: *const FfiSession,
    email: *const c_char,
    password: *const c_char,
) -> *mut FfiHttpRequest {
    build_anonymous(session, |base_url| {
        Some(Endpoint::Register {
            base_url,
            email: owned(email)?,
            password: owned(password)?,
        })
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn sl_build_mailboxes(session: *const FfiSession) -> *mut FfiHttpRequest {
    build_authenticated(session, |credentials| {
        Some(Endpoint::Mailboxes { credentials })
    })
}

/// Returns null if `email` is null.
#[unsafe(no_mangle)]
pub extern "C" fn sl_build_create_mailbox(
    session: *const FfiSession,
    email: *const c_char,
) -> *mut FfiHttpRequest {
    build_authenticated(session, |credentials| {
        Some(Endpoint::CreateMailbox {
            credentials,
            email: owned(email)?,
        })
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn sl_build_make_default_mailbox(
    session: *const FfiSession,
    mailbox_id: i64,
) -> *mut FfiHttpRequest {
    build_authenticated(session, |credentials| {
        Some(Endpoint::MakeDefaultMailbox {
            credentials,
            mailbox_id,
        })
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn sl_build_delete_mailbox(
    session: *const FfiSession,
    mailbox_id: i64,
) -> *mut FfiHttpRequest {
    build_authenticated(session, |credentials| {
        Some(Endpoint::DeleteMailbox {
            credentials,
            mailbox_id,
        })
    })
}

/// `mailbox_ids` points to `len` ids. Returns null if it is null while
/// `len` is non-zero.
#[unsafe(no_mangle)]
pub extern "C" fn sl_build_update_alias_mailboxes(
    session: *const FfiSession,
    alias_id: i64,
    mailbox_ids: *const i64,
    len: u32,
) -> *mut FfiHttpRequest {
    build_authenticated(session, |credentials| {
        let mailbox_ids = match (mailbox_ids.is_null(), len) {
            (_, 0) => Vec::new(),
            (true, _) => return None,
            (false, len) => unsafe { std::slice::from_raw_parts(mailbox_ids, len as usize) }.to_vec(),
        };
        Some(Endpoint::UpdateAliasMailboxes {
            credentials,
            alias_id,
            mailbox_ids,
        })
    })
}

/// A null `name` clears the alias name.
#[unsafe(no_mangle)]
pub extern "C" fn sl_build_update_alias_name(
    session: *const FfiSession,
    alias_id: i64,
    name: *const c_char,
) -> *mut FfiHttpRequest {
    build_authenticated(session, |credentials| {
        Some(Endpoint::UpdateAliasName {
            credentials,
            alias_id,
            name: owned(name),
        })
    })
}

/// A null `note` clears the alias note.
#[unsafe(no_mangle)]
pub extern "C" fn sl_build_update_alias_note(
    session: *const FfiSession,
    alias_id: i64,
    note: *const c_char,
) -> *mut FfiHttpRequest {
    build_authenticated(session, |credentials| {
        Some(Endpoint::UpdateAliasNote {
            credentials,
            alias_id,
            note: owned(note),
        })
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn sl_build_toggle_alias(
    session: *const FfiSession,
    alias_id: i64,
) -> *mut FfiHttpRequest {
    build_authenticated(session, |credentials| {
        Some(Endpoint::ToggleAlias {
            credentials,
            alias_id,
        })
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn sl_build_delete_alias(
    session: *const FfiSession,
    alias_id: i64,
) -> *mut FfiHttpRequest {
    build_authenticated(session, |credentials| {
        Some(Endpoint::DeleteAlias {
            credentials,
            alias_id,
        })
    })
}

/// `note` may be null; the request then has no body.
#[unsafe(no_mangle)]
pub extern "C" fn sl_build_random_alias(
    session: *const FfiSession,
    mode: FfiRandomMode,
    note: *const c_char,
) -> *mut FfiHttpRequest {
    build_authenticated(session, |credentials| {
        Some(Endpoint::RandomAlias {
            credentials,
            mode: mode.into(),
            note: owned(note),
        })
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn sl_build_user_info(session: *const FfiSession) -> *mut FfiHttpRequest {
    build_authenticated(session, |credentials| Some(Endpoint::UserInfo { credentials }))
}

// ---------------------------------------------------------------------------
// Parse response
// ---------------------------------------------------------------------------

/// Convert an `FfiHttpResponse` to a core `HttpResponse`. A null body is
/// an empty body.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    HttpResponse::new(resp.status, c_str(resp.body).unwrap_or(""))
}

fn reencode<R: ApiObject + Serialize>(kind: EndpointKind, response: HttpResponse) -> Result<String, SlError> {
    let value: R = parse_response(kind, response)?;
    serde_json::to_string(&value).map_err(|_| SlError::FailToSerializeJsonData)
}

fn confirm_deleted(kind: EndpointKind, response: HttpResponse, object: &str) -> Result<String, SlError> {
    let deleted: Deleted = parse_response(kind, response)?;
    if !deleted.deleted {
        return Err(SlError::FailToDelete(object.to_string()));
    }
    serde_json::to_string(&deleted).map_err(|_| SlError::FailToSerializeJsonData)
}

/// Decode `response` as the body type of `kind` and return it as JSON.
fn parse_to_json(kind: EndpointKind, response: HttpResponse) -> Result<String, SlError> {
    match kind {
        EndpointKind::Aliases => reencode::<AliasArray>(kind, response),
        EndpointKind::AliasActivities => reencode::<ActivityArray>(kind, response),
        EndpointKind::Contacts => reencode::<ContactArray>(kind, response),
        EndpointKind::CreateContact => reencode::<Contact>(kind, response),
        EndpointKind::Login | EndpointKind::Mfa => reencode::<UserLogin>(kind, response),
        EndpointKind::Register => reencode::<Message>(kind, response),
        EndpointKind::Mailboxes => reencode::<MailboxArray>(kind, response),
        EndpointKind::CreateMailbox => reencode::<Mailbox>(kind, response),
        EndpointKind::MakeDefaultMailbox => reencode::<Updated>(kind, response),
        EndpointKind::DeleteMailbox => confirm_deleted(kind, response, "mailbox"),
        EndpointKind::UpdateAliasMailboxes
        | EndpointKind::UpdateAliasName
        | EndpointKind::UpdateAliasNote => reencode::<OkResponse>(kind, response),
        EndpointKind::ToggleAlias => reencode::<Enabled>(kind, response),
        EndpointKind::DeleteAlias => confirm_deleted(kind, response, "alias"),
        EndpointKind::RandomAlias => reencode::<Alias>(kind, response),
        EndpointKind::UserInfo => reencode::<UserInfo>(kind, response),
    }
}

/// Parse the response to a request of `kind`.
///
/// On success the result's `payload` is the decoded body as JSON.
/// The caller must free the result with `sl_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn sl_parse_response(
    kind: FfiEndpointKind,
    response: *const FfiHttpResponse,
) -> *mut FfiSlResult {
    catch_unwind(|| {
        if response.is_null() {
            return FfiSlResult::null_arg("response");
        }
        let resp = unsafe { &*response };
        let status = resp.status;
        match parse_to_json(kind.into(), ffi_response_to_core(resp)) {
            Ok(payload) => FfiSlResult::ok(status, payload),
            Err(e) => FfiSlResult::from_error(status, e),
        }
    })
    .unwrap_or_else(|_| FfiSlResult::panic("panic in sl_parse_response"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `sl_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn sl_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        sl_free_string(req.url);
        sl_free_string(req.body);
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                sl_free_string(h.key);
                sl_free_string(h.value);
            }
        }
    });
}

/// Free an `FfiSlResult` returned by `sl_parse_response`. Safe to call with
/// null.
#[unsafe(no_mangle)]
pub extern "C" fn sl_free_result(result: *mut FfiSlResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        sl_free_string(result.error_message);
        sl_free_string(result.payload);
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn sl_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
