//! Route groups sharing a path prefix and a middleware list.
//!
//! All groups live in one [`Registry`] owned by the engine. A [`RouterGroup`] is a
//! short-lived handle to one entry of it, so nested groups never point at each
//! other: a child only copies its parent's prefix when it is created.

use crate::handler::{Handler, HandlerFunc};
use crate::router::{DuplicateRoutePolicy, RouteError, Router};
use http::Method;
use std::fmt;
use std::sync::Arc;
use tracing::info;

struct GroupEntry {
    prefix: String,
    middlewares: Vec<HandlerFunc>,
}

/// The router plus every group, in creation order. Entry 0 is the root group.
pub(crate) struct Registry {
    router: Router,
    groups: Vec<GroupEntry>,
}

impl Registry {
    pub(crate) fn new(policy: DuplicateRoutePolicy) -> Self {
        Self { router: Router::with_policy(policy), groups: vec![GroupEntry { prefix: String::new(), middlewares: vec![] }] }
    }

    pub(crate) fn router(&self) -> &Router {
        &self.router
    }

    pub(crate) fn root(&mut self) -> RouterGroup<'_> {
        RouterGroup { registry: self, index: 0 }
    }

    /// Appends a group nested in `parent`, its prefix being the parent's prefix plus `prefix`.
    pub(crate) fn new_group(&mut self, parent: usize, prefix: &str) -> RouterGroup<'_> {
        let prefix = format!("{}{}", self.groups[parent].prefix, prefix);
        self.groups.push(GroupEntry { prefix, middlewares: vec![] });
        let index = self.groups.len() - 1;
        RouterGroup { registry: self, index }
    }

    /// Middlewares of every group whose prefix starts `path`, in group creation order.
    ///
    /// The comparison is a plain string prefix: a `/api` group also applies to `/apix`.
    pub(crate) fn middlewares_for(&self, path: &str) -> Vec<HandlerFunc> {
        self.groups
            .iter()
            .filter(|group| path.starts_with(&group.prefix))
            .flat_map(|group| group.middlewares.iter().cloned())
            .collect()
    }
}

pub struct RouterGroup<'r> {
    registry: &'r mut Registry,
    index: usize,
}

macro_rules! method_route {
    ($name:ident, $method:expr) => {
        #[doc = concat!("Registers `handler` for `", stringify!($method), "` requests on `comp` under this group.")]
        pub fn $name<H: Handler + 'static>(&mut self, comp: &str, handler: H) -> Result<&mut Self, RouteError> {
            self.add_route($method, comp, handler)?;
            Ok(self)
        }
    };
}

impl<'r> RouterGroup<'r> {
    pub fn prefix(&self) -> &str {
        &self.entry().prefix
    }

    fn entry(&self) -> &GroupEntry {
        &self.registry.groups[self.index]
    }

    /// Creates a group nested in this one, with `prefix` appended to this group's prefix.
    pub fn group(&mut self, prefix: &str) -> RouterGroup<'_> {
        self.registry.new_group(self.index, prefix)
    }

    /// Appends a middleware to this group.
    ///
    /// It runs for every request whose path starts with the group prefix, after the
    /// middlewares of the groups created before this one.
    pub fn use_middleware<H: Handler + 'static>(&mut self, middleware: H) -> &mut Self {
        self.registry.groups[self.index].middlewares.push(Arc::new(middleware));
        self
    }

    pub fn add_route<H: Handler + 'static>(&mut self, method: Method, comp: &str, handler: H) -> Result<(), RouteError> {
        let pattern = format!("{}{}", self.prefix(), comp);
        info!("Route {:>4} - {}", method.as_str(), pattern);
        self.registry.router.add_route(method, &pattern, Arc::new(handler))
    }

    method_route!(get, Method::GET);
    method_route!(post, Method::POST);
    method_route!(put, Method::PUT);
    method_route!(delete, Method::DELETE);
    method_route!(patch, Method::PATCH);
    method_route!(head, Method::HEAD);
    method_route!(options, Method::OPTIONS);
}

impl fmt::Debug for RouterGroup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterGroup").field("prefix", &self.prefix()).finish_non_exhaustive()
    }
}
