//! Scripted, recording [`Transport`] for tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use sync_remote::{Error, HttpRequest, HttpResponse, Method, Result, Transport};

/// A canned reply.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
}

impl MockResponse {
    pub fn ok(body: Value) -> Self {
        Self::json(200, body)
    }

    pub fn created(body: Value) -> Self {
        Self::json(201, body)
    }

    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }

    pub fn no_content() -> Self {
        Self {
            status: 204,
            body: String::new(),
        }
    }

    /// An error response with a `{ "message": ... }` body.
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, json!({ "message": message }))
    }

    fn into_http(self) -> HttpResponse {
        HttpResponse {
            reason: reason_phrase(self.status).to_string(),
            status: self.status,
            body: self.body,
            retry_after_secs: None,
        }
    }
}

/// A request as the mock saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub endpoint: String,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

type Handler = Arc<dyn Fn(&HttpRequest) -> Result<MockResponse> + Send + Sync>;

struct Route {
    method: Method,
    endpoint: String,
    handler: Handler,
}

/// Transport answering from a route table and recording every request.
///
/// Routes match on method and exact endpoint (including query string).
/// The most recently registered route wins, so tests can override a
/// fixture route. Unrouted requests get a 404.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer `method endpoint` with a fixed response.
    pub fn route(&self, method: Method, endpoint: impl Into<String>, response: MockResponse) {
        self.route_fn(method, endpoint, move |_| Ok(response.clone()));
    }

    /// Answer `method endpoint` by computing a response from the request.
    pub fn route_fn<F>(&self, method: Method, endpoint: impl Into<String>, handler: F)
    where
        F: Fn(&HttpRequest) -> Result<MockResponse> + Send + Sync + 'static,
    {
        self.routes.lock().push(Route {
            method,
            endpoint: endpoint.into(),
            handler: Arc::new(handler),
        });
    }

    /// Make `method endpoint` fail as if the connection dropped.
    pub fn fail_network(&self, method: Method, endpoint: impl Into<String>) {
        self.route_fn(method, endpoint, |_| Err(Error::transport("connection reset by peer")));
    }

    /// All requests seen so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// `"METHOD endpoint"` for every request, in order.
    pub fn calls(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|r| format!("{} {}", r.method, r.endpoint))
            .collect()
    }

    /// Number of requests with `method` whose endpoint starts with `prefix`.
    pub fn count(&self, method: Method, prefix: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.endpoint.starts_with(prefix))
            .count()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().push(RecordedRequest {
            method: request.method,
            endpoint: request.endpoint.clone(),
            body: request.body.clone(),
            headers: request.headers.clone(),
        });

        let handler = self
            .routes
            .lock()
            .iter()
            .rev()
            .find(|route| route.method == request.method && route.endpoint == request.endpoint)
            .map(|route| Arc::clone(&route.handler));

        match handler {
            Some(handler) => handler(&request).map(MockResponse::into_http),
            None => Ok(MockResponse::error(404, "Not Found").into_http()),
        }
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        _ => "",
    }
}
