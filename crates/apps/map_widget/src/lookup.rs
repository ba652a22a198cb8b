use std::rc::Rc;

use foundation::BoundaryId;
use futures_util::future::LocalBoxFuture;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use runtime::{EventLog, RequestId, Spawn, TaskRegistry};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    Network(String),
    Status(u16),
    Decode(String),
}

impl std::fmt::Display for LookupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupError::Network(msg) => write!(f, "request failed: {msg}"),
            LookupError::Status(code) => write!(f, "unexpected HTTP status {code}"),
            LookupError::Decode(msg) => write!(f, "response is not JSON: {msg}"),
        }
    }
}

impl std::error::Error for LookupError {}

/// Outbound HTTP used for info lookups: a single `GET` expecting a JSON body.
///
/// Implementations must map non-2xx statuses to [`LookupError::Status`].
pub trait InfoClient {
    fn get_json(&self, url: &str) -> LocalBoxFuture<'static, Result<Value, LookupError>>;
}

impl<C: InfoClient + ?Sized> InfoClient for Rc<C> {
    fn get_json(&self, url: &str) -> LocalBoxFuture<'static, Result<Value, LookupError>> {
        (**self).get_json(url)
    }
}

/// RFC 3986 unreserved characters pass through; everything else is escaped.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Longest response body copied into a `lookup.succeeded` message.
pub const MAX_LOGGED_BODY: usize = 512;

/// `<endpoint>/<id>`, with the id percent-encoded as one path segment.
pub fn info_url(endpoint: &str, id: &BoundaryId) -> String {
    format!(
        "{}/{}",
        endpoint.trim_end_matches('/'),
        utf8_percent_encode(id.as_str(), PATH_SEGMENT)
    )
}

/// Maps a finished HTTP exchange to the lookup result. Shared by the native
/// and browser clients so both report statuses and bad bodies the same way.
pub fn decode_response(status: u16, body: &str) -> Result<Value, LookupError> {
    if !(200..300).contains(&status) {
        return Err(LookupError::Status(status));
    }
    serde_json::from_str(body).map_err(|e| LookupError::Decode(e.to_string()))
}

/// Body text for the event log, cut at a char boundary.
fn summarize_body(body: &Value) -> String {
    let mut text = body.to_string();
    if text.len() > MAX_LOGGED_BODY {
        let mut end = MAX_LOGGED_BODY;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        let total = text.len();
        text.truncate(end);
        text.push_str(&format!("... ({total} bytes)"));
    }
    text
}

/// Fire-and-forget info requests, cancellable as a group.
///
/// Every request reports exactly one of `lookup.succeeded`, `lookup.failed`
/// or `lookup.cancelled` on the event log. Nothing is cached, retried or
/// de-duplicated.
pub struct BoundaryInfoLookup<C> {
    endpoint: String,
    client: Rc<C>,
    tasks: TaskRegistry,
    log: EventLog,
}

impl<C> BoundaryInfoLookup<C> {
    pub fn new(endpoint: impl Into<String>, client: Rc<C>, log: EventLog) -> Self {
        Self {
            endpoint: endpoint.into(),
            client,
            tasks: TaskRegistry::new(),
            log,
        }
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    pub fn cancel_all(&mut self) -> Vec<RequestId> {
        let cancelled = self.tasks.cancel_all();
        for request in &cancelled {
            self.log
                .info("lookup.cancelled", format!("{request} cancelled on teardown"));
        }
        cancelled
    }
}

impl<C: InfoClient + 'static> BoundaryInfoLookup<C> {
    pub fn start<S: Spawn + ?Sized>(&mut self, spawner: &S, id: &BoundaryId) -> RequestId {
        let url = info_url(&self.endpoint, id);
        let client = Rc::clone(&self.client);
        let log = self.log.clone();
        let boundary = id.clone();

        self.tasks.spawn(spawner, move |request| {
            log.info(
                "lookup.started",
                format!("{request} fetching info for boundary {boundary}: GET {url}"),
            );
            let response = client.get_json(&url);
            async move {
                match response.await {
                    Ok(body) => log.info(
                        "lookup.succeeded",
                        format!(
                            "{request} boundary info for {boundary}: {}",
                            summarize_body(&body)
                        ),
                    ),
                    Err(err) => log.error(
                        "lookup.failed",
                        format!("{request} error fetching boundary info for {boundary}: {err}"),
                    ),
                }
            }
        })
    }
}
