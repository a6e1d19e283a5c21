//! The engine: route registration, request dispatch and templates.
//!
//! An [`Engine`] is filled in through `&mut self` before it serves, then shared
//! read-only by every connection behind an `Arc`.

use crate::Context;
use crate::group::{Registry, RouterGroup};
use crate::handler::Handler;
use crate::middleware::panic_message;
use crate::render::{TemplateError, Templates};
use crate::router::{DuplicateRoutePolicy, RouteError, Router};
use crate::server::{Server, ServerError};
use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, Request, Response, StatusCode};
use minijinja::Value;
use serde::Deserialize;
use std::borrow::Cow;
use std::convert::Infallible;
use std::fmt;
use std::net::ToSocketAddrs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use tracing::error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub duplicate_routes: DuplicateRoutePolicy,
}

pub struct Engine {
    registry: Registry,
    templates: Arc<Templates>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! engine_route {
    ($name:ident) => {
        /// Registers a route on the root group, see [`RouterGroup`].
        pub fn $name<H: Handler + 'static>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError> {
            self.registry.root().$name(pattern, handler)?;
            Ok(self)
        }
    };
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self { registry: Registry::new(config.duplicate_routes), templates: Arc::new(Templates::default()) }
    }

    /// The group every route and group of this engine is nested in, with an empty prefix.
    pub fn root(&mut self) -> RouterGroup<'_> {
        self.registry.root()
    }

    pub fn group(&mut self, prefix: &str) -> RouterGroup<'_> {
        self.registry.new_group(0, prefix)
    }

    /// Adds a middleware that runs for every request.
    pub fn use_middleware<H: Handler + 'static>(&mut self, middleware: H) -> &mut Self {
        self.registry.root().use_middleware(middleware);
        self
    }

    pub fn add_route<H: Handler + 'static>(&mut self, method: Method, pattern: &str, handler: H) -> Result<(), RouteError> {
        self.registry.root().add_route(method, pattern, handler)
    }

    engine_route!(get);
    engine_route!(post);
    engine_route!(put);
    engine_route!(delete);
    engine_route!(patch);
    engine_route!(head);
    engine_route!(options);

    pub fn router(&self) -> &Router {
        self.registry.router()
    }

    pub fn add_template(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        source: impl Into<Cow<'static, str>>,
    ) -> Result<(), TemplateError> {
        Arc::make_mut(&mut self.templates).add_template(name, source)
    }

    /// Loads the `.html` and `.tmpl` files of `dir`, see [`Templates::load_dir`].
    pub fn load_html_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize, TemplateError> {
        Arc::make_mut(&mut self.templates).load_dir(dir)
    }

    /// Makes `f` callable from every template.
    pub fn add_template_function<F>(&mut self, name: impl Into<Cow<'static, str>>, f: F)
    where
        F: Fn(&[Value]) -> Result<Value, minijinja::Error> + Send + Sync + 'static,
    {
        Arc::make_mut(&mut self.templates).add_function(name, f);
    }

    /// Runs the request through the middlewares of its groups and the matched route.
    ///
    /// A panic escaping the chain answers `500 Internal Server Error`.
    pub fn handle(&self, request: Request<Bytes>) -> Response<Bytes> {
        let middlewares = self.registry.middlewares_for(request.uri().path());
        let mut c = Context::new(request, middlewares, Arc::clone(&self.templates));

        match panic::catch_unwind(AssertUnwindSafe(|| self.router().handle(&mut c))) {
            Ok(()) => c.into_response(),
            Err(payload) => {
                error!(cause = panic_message(&*payload), uri = c.request_uri(), "handler panicked");
                let mut response = Response::new(Bytes::from_static(b"Internal Server Error"));
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                response
            }
        }
    }

    /// Serves this engine on `address` until the process stops.
    pub async fn run<A: ToSocketAddrs>(self, address: A) -> Result<(), ServerError> {
        Server::builder().engine(self).address(address).build()?.start().await
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine").field("router", self.router()).finish_non_exhaustive()
    }
}

#[async_trait]
impl gee_http::handler::Handler for Engine {
    type Error = Infallible;

    async fn call(&self, req: Request<Bytes>) -> Result<Response<Bytes>, Self::Error> {
        Ok(self.handle(req))
    }
}

#[cfg(test)]
mod tests {
    use super::{Engine, EngineConfig};
    use crate::Context;
    use crate::middleware::Recovery;
    use crate::router::{DuplicateRoutePolicy, RouteError};
    use bytes::Bytes;
    use http::{Method, Request, Response, StatusCode};
    use minijinja::Value;
    use std::sync::{Arc, Mutex};

    fn request(method: Method, uri: &str) -> Request<Bytes> {
        Request::builder().method(method).uri(uri).body(Bytes::new()).unwrap()
    }

    fn boom(_c: &mut Context) {
        panic!("boom")
    }

    fn body(response: &Response<Bytes>) -> &str {
        std::str::from_utf8(response.body()).unwrap()
    }

    fn tracer(log: &Arc<Mutex<Vec<String>>>, name: &'static str) -> impl Fn(&mut Context) + Send + Sync + 'static {
        let log = Arc::clone(log);
        move |c: &mut Context| {
            log.lock().unwrap().push(format!("{name}-in"));
            c.next();
            log.lock().unwrap().push(format!("{name}-out"));
        }
    }

    #[test]
    fn test_group_middlewares_wrap_handler() {
        let log = Arc::new(Mutex::new(vec![]));
        let mut engine = Engine::new();
        engine.use_middleware(tracer(&log, "A"));

        let handler_log = Arc::clone(&log);
        let mut api = engine.group("/api");
        api.use_middleware(tracer(&log, "B"));
        api.get("/users", move |c: &mut Context| {
            handler_log.lock().unwrap().push("handler".to_string());
            c.string(StatusCode::OK, "users");
        })
        .unwrap();

        let response = engine.handle(request(Method::GET, "/api/users"));

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(&response), "users");
        assert_eq!(*log.lock().unwrap(), ["A-in", "B-in", "handler", "B-out", "A-out"]);
    }

    #[test]
    fn test_middlewares_wrap_not_found() {
        let log = Arc::new(Mutex::new(vec![]));
        let mut engine = Engine::new();
        engine.use_middleware(tracer(&log, "A"));
        engine.group("/api").use_middleware(tracer(&log, "B"));

        let response = engine.handle(request(Method::GET, "/missing"));

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(&response), "404 NOT FOUND: /missing\n");
        assert_eq!(*log.lock().unwrap(), ["A-in", "A-out"]);
    }

    #[test]
    fn test_nested_groups() {
        let mut engine = Engine::new();
        {
            let mut v2 = engine.group("/v2");
            v2.get("/hello/:name", |c: &mut Context| {
                let body = format!("hello {}, you're at {}\n", c.param("name").unwrap_or_default(), c.path());
                c.string(StatusCode::OK, body);
            })
            .unwrap();
            v2.group("/admin").post("/login", |c: &mut Context| {
                let username = c.post_form("username").unwrap_or_default();
                c.json(StatusCode::OK, &serde_json::json!({ "username": username }));
            })
            .unwrap();
        }

        let response = engine.handle(request(Method::GET, "/v2/hello/geektutu"));
        assert_eq!(body(&response), "hello geektutu, you're at /v2/hello/geektutu\n");

        let login = Request::builder()
            .method(Method::POST)
            .uri("/v2/admin/login")
            .body(Bytes::from_static(b"username=geektutu&password=1234"))
            .unwrap();
        let response = engine.handle(login);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(&response), r#"{"username":"geektutu"}"#);
    }

    #[test]
    fn test_short_circuit_middleware() {
        let mut engine = Engine::new();
        engine.group("/admin").use_middleware(|c: &mut Context| {
            if c.query("token").as_deref() != Some("secret") {
                c.fail(StatusCode::UNAUTHORIZED, "unauthorized");
            }
            c.next();
        });
        engine.get("/admin/panel", |c: &mut Context| c.string(StatusCode::OK, "panel")).unwrap();

        let response = engine.handle(request(Method::GET, "/admin/panel"));
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body(&response), r#"{"message":"unauthorized"}"#);

        let response = engine.handle(request(Method::GET, "/admin/panel?token=secret"));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(&response), "panel");
    }

    #[test]
    fn test_panic_without_recovery() {
        let mut engine = Engine::new();
        engine.get("/panic", boom).unwrap();

        let response = engine.handle(request(Method::GET, "/panic"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body(&response), "Internal Server Error");
    }

    #[test]
    fn test_panic_with_recovery() {
        let mut engine = Engine::new();
        engine.use_middleware(Recovery);
        engine.get("/panic", boom).unwrap();

        let response = engine.handle(request(Method::GET, "/panic"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body(&response), r#"{"message":"Internal Server Error"}"#);
    }

    #[test]
    fn test_duplicate_policy() {
        let mut engine = Engine::new();
        engine.get("/", |c: &mut Context| c.string(StatusCode::OK, "first")).unwrap();
        let err = engine.get("/", |c: &mut Context| c.string(StatusCode::OK, "second")).err();
        assert_eq!(err, Some(RouteError::DuplicateRoute { method: Method::GET, pattern: "/".into() }));

        let mut engine = Engine::with_config(EngineConfig { duplicate_routes: DuplicateRoutePolicy::Overwrite });
        engine.get("/", |c: &mut Context| c.string(StatusCode::OK, "first")).unwrap();
        engine.get("/", |c: &mut Context| c.string(StatusCode::OK, "second")).unwrap();
        assert_eq!(engine.router().len(), 1);
        assert_eq!(body(&engine.handle(request(Method::GET, "/"))), "second");
    }

    #[test]
    fn test_html() {
        let mut engine = Engine::new();
        engine.add_template_function("upper", |args: &[Value]| {
            Ok(Value::from(args.first().and_then(Value::as_str).unwrap_or_default().to_uppercase()))
        });
        engine.add_template("css.tmpl", "<p>{{ upper(title) }}</p>").unwrap();
        engine
            .get("/", |c: &mut Context| c.html(StatusCode::OK, "css.tmpl", minijinja::context! { title => "gee" }))
            .unwrap();

        let response = engine.handle(request(Method::GET, "/"));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/html; charset=utf-8");
        assert_eq!(body(&response), "<p>GEE</p>");
    }

    #[test]
    fn test_html_escapes_request_data() {
        let mut engine = Engine::new();
        engine.add_template("css.tmpl", "<p>{{ title }}</p>").unwrap();
        engine
            .get("/", |c: &mut Context| {
                let title = c.query("title").unwrap_or_default();
                c.html(StatusCode::OK, "css.tmpl", minijinja::context! { title => title });
            })
            .unwrap();

        let response = engine.handle(request(Method::GET, "/?title=%3Cscript%3E"));
        assert_eq!(body(&response), "<p>&lt;script&gt;</p>");
    }

    #[test]
    fn test_config_deserialize() {
        let config: EngineConfig = serde_json::from_str(r#"{"duplicate_routes": "overwrite"}"#).unwrap();
        assert_eq!(config.duplicate_routes, DuplicateRoutePolicy::Overwrite);

        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[tokio::test]
    async fn test_engine_is_http_handler() {
        use gee_http::handler::Handler;

        let mut engine = Engine::new();
        engine.get("/ping", |c: &mut Context| c.string(StatusCode::OK, "pong")).unwrap();

        let response = engine.call(request(Method::GET, "/ping")).await.unwrap();
        assert_eq!(body(&response), "pong");
    }
}
