//! Scripted transport for view-model tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::oneshot;
use url::Url;

use crate::http::{HttpRequest, HttpResponse};
use crate::session::{ApiKey, Session};
use crate::transport::{Transport, TransportError};

pub(crate) enum Reply {
    Now(HttpResponse),
    /// Held until the test sends the response.
    Later(oneshot::Receiver<HttpResponse>),
    Offline,
}

/// Answers requests in issue order from a queue of replies.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn reply(&self, status: u16, body: &str) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Reply::Now(HttpResponse::new(status, body)));
        self
    }

    pub(crate) fn offline(&self) -> &Self {
        self.replies.lock().unwrap().push_back(Reply::Offline);
        self
    }

    pub(crate) fn reply_later(&self) -> oneshot::Sender<HttpResponse> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().unwrap().push_back(Reply::Later(rx));
        tx
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let reply = {
            self.requests.lock().unwrap().push(request);
            self.replies.lock().unwrap().pop_front()
        };
        match reply {
            Some(Reply::Now(response)) => Ok(response),
            Some(Reply::Later(rx)) => rx
                .await
                .map_err(|_| TransportError("reply dropped".to_string())),
            Some(Reply::Offline) | None => Err(TransportError("offline".to_string())),
        }
    }
}

pub(crate) fn signed_in_session() -> Session {
    Session::with_api_key(
        Url::parse("https://app.simplelogin.io").unwrap(),
        ApiKey::new("test-key"),
    )
}

pub(crate) fn alias_json(id: i64) -> String {
    format!(
        r#"{{"id":{id},"email":"alias{id}@sl.local","name":null,"enabled":true,"creation_timestamp":{id},"note":null,"nb_block":0,"nb_forward":0,"nb_reply":0,"mailboxes":[{{"id":1,"email":"me@example.com"}}]}}"#
    )
}

pub(crate) fn aliases_page(ids: std::ops::Range<i64>) -> String {
    let aliases: Vec<String> = ids.map(alias_json).collect();
    format!(r#"{{"aliases":[{}]}}"#, aliases.join(","))
}
