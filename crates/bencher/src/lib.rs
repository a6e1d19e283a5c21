//! Fixtures shared by the benchmarks.

use gee_web::{Context, HandlerFunc, Router};
use http::Method;
use std::sync::Arc;

/// A raw request fed to the decoder benchmarks.
#[derive(Debug, Copy, Clone)]
pub struct RequestFile {
    file_name: &'static str,
    content: &'static str,
}

impl RequestFile {
    pub const fn new(file_name: &'static str, content: &'static str) -> Self {
        Self { file_name, content }
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }
}

/// A request path to look up and the pattern expected to match it, if any.
#[derive(Debug, Copy, Clone)]
pub struct LookupCase {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    pattern: Option<&'static str>,
}

impl LookupCase {
    pub const fn hit(name: &'static str, method: &'static str, path: &'static str, pattern: &'static str) -> Self {
        Self { name, method, path, pattern: Some(pattern) }
    }

    pub const fn miss(name: &'static str, method: &'static str, path: &'static str) -> Self {
        Self { name, method, path, pattern: None }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn method(&self) -> Method {
        Method::from_bytes(self.method.as_bytes()).unwrap_or(Method::GET)
    }

    pub fn path(&self) -> &'static str {
        self.path
    }

    pub fn pattern(&self) -> Option<&'static str> {
        self.pattern
    }
}

/// A small REST api, registered in this order.
pub static ROUTES: &[(&str, &str)] = &[
    ("GET", "/"),
    ("GET", "/about"),
    ("GET", "/assets/*filepath"),
    ("GET", "/v1/users"),
    ("POST", "/v1/users"),
    ("GET", "/v1/users/:id"),
    ("PUT", "/v1/users/:id"),
    ("DELETE", "/v1/users/:id"),
    ("GET", "/v1/users/:id/repos"),
    ("GET", "/v1/users/:id/repos/:repo"),
    ("GET", "/v1/users/:id/repos/:repo/issues"),
    ("GET", "/v1/users/:id/repos/:repo/issues/:number"),
    ("GET", "/v1/users/:id/followers"),
    ("GET", "/v1/users/:id/following"),
    ("GET", "/v1/orgs/:org"),
    ("GET", "/v1/orgs/:org/members"),
    ("GET", "/v1/orgs/:org/repos"),
    ("GET", "/v1/search/repositories"),
    ("GET", "/v1/search/users"),
    ("GET", "/v1/gists/:id/*file"),
    ("POST", "/admin/login"),
    ("GET", "/admin/dashboard"),
    ("GET", "/admin/users/:id/audit"),
];

pub static LOOKUPS: &[LookupCase] = &[
    LookupCase::hit("static_root", "GET", "/", "/"),
    LookupCase::hit("static_nested", "GET", "/v1/search/users", "/v1/search/users"),
    LookupCase::hit("one_param", "GET", "/v1/users/42", "/v1/users/:id"),
    LookupCase::hit("three_params", "GET", "/v1/users/42/repos/gee/issues/7", "/v1/users/:id/repos/:repo/issues/:number"),
    LookupCase::hit("wildcard", "GET", "/assets/css/themes/dark/main.css", "/assets/*filepath"),
    LookupCase::miss("miss_deep", "GET", "/v1/users/42/repos/gee/pulls/7"),
    LookupCase::miss("miss_method", "PATCH", "/v1/users/42"),
];

fn noop(_c: &mut Context) {}

/// A router holding every entry of [`ROUTES`].
pub fn router() -> Router {
    let mut router = Router::new();
    let handler: HandlerFunc = Arc::new(noop);
    for (method, pattern) in ROUTES {
        let method = Method::from_bytes(method.as_bytes()).unwrap_or(Method::GET);
        if let Err(e) = router.add_route(method, pattern, Arc::clone(&handler)) {
            panic!("benchmark route {pattern} rejected: {e}");
        }
    }
    router
}
