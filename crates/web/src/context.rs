//! Per-request state shared by every link of the handler chain.
//!
//! A [`Context`] owns the decoded request, the path parameters bound by the router,
//! the response being written, and the [`Chain`] with its cursor. It is created for
//! one request and dropped once the response is produced.

use crate::chain::Chain;
use crate::handler::HandlerFunc;
use crate::render::Templates;
use crate::router::PathParams;
use bytes::{Bytes, BytesMut};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Response, StatusCode};
use mime::Mime;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{error, trace};

pub struct Context {
    request: Request<Bytes>,
    params: PathParams,
    chain: Chain,
    templates: Arc<Templates>,
    aborted: bool,

    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
}

impl Context {
    /// Creates a context for `request` with the given middlewares queued.
    pub fn new(request: Request<Bytes>, middlewares: Vec<HandlerFunc>, templates: Arc<Templates>) -> Self {
        Self {
            request,
            params: PathParams::empty(),
            chain: Chain::new(middlewares),
            templates,
            aborted: false,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
        }
    }

    /// Runs the next handler of the chain, if there is one.
    ///
    /// Work a middleware does after `next` returns happens after every later
    /// handler has finished. Calling `next` once the chain is exhausted does nothing.
    pub fn next(&mut self) {
        if let Some(handler) = self.chain.advance() {
            trace!(position = ?self.chain.position(), len = self.chain.len(), "run handler");
            handler.handle(self);
        }
    }

    /// Writes `{"message": message}` with `status` and stops the chain.
    ///
    /// Handlers after the current one never run; middlewares already running
    /// still finish the work after their `next` call.
    pub fn fail(&mut self, status: StatusCode, message: impl Into<String>) {
        self.chain.exhaust();
        self.aborted = true;
        self.json(status, &serde_json::json!({ "message": message.into() }));
    }

    /// Whether [`Context::fail`] stopped the chain
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub(crate) fn push_handler(&mut self, handler: HandlerFunc) {
        self.chain.push(handler);
    }

    pub(crate) fn set_params(&mut self, params: PathParams) {
        self.params = params;
    }

    // request side

    pub fn request(&self) -> &Request<Bytes> {
        &self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// The request path, without the query string
    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    /// The path and query string as sent by the client
    pub fn request_uri(&self) -> &str {
        self.request.uri().path_and_query().map_or_else(|| self.path(), |pq| pq.as_str())
    }

    pub fn headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    pub fn body(&self) -> &Bytes {
        self.request.body()
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key)
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }

    /// First value of `key` in the url-encoded query string
    pub fn query(&self, key: &str) -> Option<String> {
        let query = self.request.uri().query()?;
        first_value(serde_urlencoded::from_str(query).ok()?, key)
    }

    /// First value of `key` in a url-encoded request body
    pub fn post_form(&self, key: &str) -> Option<String> {
        first_value(serde_urlencoded::from_bytes(self.request.body()).ok()?, key)
    }

    // response side

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    pub fn response_headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The response body written so far
    pub fn written(&self) -> &[u8] {
        &self.body
    }

    /// Writes `body` as plain text.
    pub fn string(&mut self, status: StatusCode, body: impl AsRef<str>) {
        self.set_content_type(&mime::TEXT_PLAIN_UTF_8);
        self.status(status);
        self.body.extend_from_slice(body.as_ref().as_bytes());
    }

    /// Serializes `value` as JSON; a serialization failure becomes a 500.
    pub fn json<T: Serialize + ?Sized>(&mut self, status: StatusCode, value: &T) {
        match serde_json::to_vec(value) {
            Ok(json) => {
                self.set_content_type(&mime::APPLICATION_JSON);
                self.status(status);
                self.body.extend_from_slice(&json);
            }
            Err(e) => {
                error!(cause = %e, path = self.path(), "serialize json response error");
                self.string(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
            }
        }
    }

    pub fn data(&mut self, status: StatusCode, data: impl AsRef<[u8]>) {
        self.status(status);
        self.body.extend_from_slice(data.as_ref());
    }

    /// Renders the template registered as `name`; a render failure becomes a 500.
    pub fn html<T: Serialize>(&mut self, status: StatusCode, name: &str, value: T) {
        match self.templates.render(name, value) {
            Ok(html) => {
                self.set_content_type(&mime::TEXT_HTML_UTF_8);
                self.status(status);
                self.body.extend_from_slice(html.as_bytes());
            }
            Err(e) => {
                error!(cause = %e, template = name, "render html error");
                self.string(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
            }
        }
    }

    /// Drops everything written so far.
    pub(crate) fn reset_response(&mut self) {
        self.status = StatusCode::OK;
        self.headers.clear();
        self.body.clear();
    }

    fn set_content_type(&mut self, mime: &Mime) {
        if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
            self.headers.insert(CONTENT_TYPE, value);
        }
    }

    /// Converts the written status, headers and body into the response.
    pub fn into_response(self) -> Response<Bytes> {
        let mut response = Response::new(self.body.freeze());
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", self.method())
            .field("uri", self.request.uri())
            .field("params", &self.params)
            .field("chain", &self.chain)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

fn first_value(pairs: Vec<(String, String)>, key: &str) -> Option<String> {
    pairs.into_iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::Context;
    use crate::handler::{HandlerFunc, MockHandler};
    use crate::render::Templates;
    use bytes::Bytes;
    use http::{Method, Request, StatusCode};
    use std::sync::{Arc, Mutex};

    fn request(method: Method, uri: &str, body: &'static str) -> Request<Bytes> {
        Request::builder().method(method).uri(uri).body(Bytes::from_static(body.as_bytes())).unwrap()
    }

    fn context(handlers: Vec<HandlerFunc>) -> Context {
        Context::new(request(Method::GET, "/", ""), handlers, Arc::new(Templates::default()))
    }

    fn recording(log: &Arc<Mutex<Vec<String>>>, name: &'static str, call_next: bool) -> HandlerFunc {
        let log = Arc::clone(log);
        Arc::new(move |c: &mut Context| {
            log.lock().unwrap().push(format!("{name}-in"));
            if call_next {
                c.next();
            }
            log.lock().unwrap().push(format!("{name}-out"));
        })
    }

    #[test]
    fn test_onion_order() {
        let log = Arc::new(Mutex::new(vec![]));
        let mut c = context(vec![recording(&log, "a", true), recording(&log, "b", true), recording(&log, "h", true)]);

        c.next();

        assert_eq!(*log.lock().unwrap(), ["a-in", "b-in", "h-in", "h-out", "b-out", "a-out"]);
        assert!(c.chain().is_finished());
    }

    #[test]
    fn test_short_circuit_stops_the_rest() {
        let log = Arc::new(Mutex::new(vec![]));
        let mut terminal = MockHandler::new();
        terminal.expect_handle().times(0);

        let mut c = context(vec![recording(&log, "a", true), recording(&log, "guard", false), Arc::new(terminal)]);
        c.next();

        assert_eq!(*log.lock().unwrap(), ["a-in", "guard-in", "guard-out", "a-out"]);
        assert!(!c.chain().is_finished());
    }

    #[test]
    fn test_middleware_without_next_is_not_a_pass_through() {
        let mut first = MockHandler::new();
        first.expect_handle().times(1).return_const(());
        let mut second = MockHandler::new();
        second.expect_handle().times(0);

        let mut c = context(vec![Arc::new(first), Arc::new(second)]);
        c.next();
    }

    #[test]
    fn test_next_past_the_end_is_noop() {
        let mut handler = MockHandler::new();
        handler.expect_handle().times(1).returning(|c| {
            c.next();
            c.next();
        });

        let mut c = context(vec![Arc::new(handler)]);
        c.next();
        c.next();
    }

    #[test]
    fn test_fail_aborts() {
        let mut terminal = MockHandler::new();
        terminal.expect_handle().times(0);

        let auth: HandlerFunc = Arc::new(|c: &mut Context| {
            c.fail(StatusCode::UNAUTHORIZED, "need login");
            c.next();
        });

        let mut c = context(vec![auth, Arc::new(terminal)]);
        c.next();

        assert!(c.is_aborted());
        let response = c.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()["content-type"], "application/json");
        assert_eq!(&response.body()[..], br#"{"message":"need login"}"#);
    }

    #[test]
    fn test_query_and_form() {
        let c = Context::new(
            request(Method::POST, "/login?from=home&from=ignored&empty=", "username=geek&pass=1%202"),
            vec![],
            Arc::new(Templates::default()),
        );

        assert_eq!(c.query("from").as_deref(), Some("home"));
        assert_eq!(c.query("empty").as_deref(), Some(""));
        assert_eq!(c.query("missing"), None);
        assert_eq!(c.post_form("username").as_deref(), Some("geek"));
        assert_eq!(c.post_form("pass").as_deref(), Some("1 2"));
        assert_eq!(c.path(), "/login");
        assert_eq!(c.request_uri(), "/login?from=home&from=ignored&empty=");
    }

    #[test]
    fn test_string_response() {
        let mut c = context(vec![]);
        c.string(StatusCode::NOT_FOUND, "404 NOT FOUND: /\n");

        assert_eq!(c.status_code(), StatusCode::NOT_FOUND);
        let response = c.into_response();
        assert_eq!(response.headers()["content-type"], "text/plain; charset=utf-8");
        assert_eq!(&response.body()[..], b"404 NOT FOUND: /\n");
    }

    #[test]
    fn test_writes_append() {
        let mut c = context(vec![]);
        c.data(StatusCode::OK, b"ab");
        c.data(StatusCode::CREATED, "cd");

        assert_eq!(c.written(), b"abcd");
        assert_eq!(c.into_response().status(), StatusCode::CREATED);
    }

    #[test]
    fn test_missing_template_is_server_error() {
        let mut c = context(vec![]);
        c.html(StatusCode::OK, "missing.tmpl", ());
        assert_eq!(c.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
