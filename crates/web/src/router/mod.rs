//! Method and path routing.
//!
//! Every HTTP method owns a prefix tree of [`Segment`]s. A lookup walks the tree of
//! the request method depth first, trying children in the order they were
//! registered, and binds the `:param` and `*wildcard` segments of the matched
//! pattern against the request path.

mod node;
mod params;
mod pattern;

pub use params::PathParams;
pub use pattern::{Segment, parse_pattern, split_segments};

use crate::Context;
use crate::handler::HandlerFunc;
use http::{Method, StatusCode};
use node::Node;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// What [`Router::add_route`] does when the target slot is already taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateRoutePolicy {
    /// Refuse the registration with a [`RouteError`].
    #[default]
    Reject,
    /// Replace the registered route, logging a warning.
    Overwrite,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RouteError {
    #[error("route {method} {pattern} is already registered")]
    DuplicateRoute { method: Method, pattern: String },

    #[error("route {method} {pattern} conflicts with registered route {existing}")]
    ConflictingRoute { method: Method, pattern: String, existing: String },
}

/// Key of the route table: a method and the pattern as registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    method: Method,
    pattern: String,
}

impl RouteKey {
    pub fn new(method: Method, pattern: impl Into<String>) -> Self {
        Self { method, pattern: pattern.into() }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.method, self.pattern)
    }
}

/// A successful lookup: the registered pattern and the parameters bound from the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'router> {
    pattern: &'router str,
    params: PathParams,
}

impl<'router> RouteMatch<'router> {
    pub fn pattern(&self) -> &'router str {
        self.pattern
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }

    pub fn into_params(self) -> PathParams {
        self.params
    }
}

pub struct Router {
    roots: HashMap<Method, Node>,
    handlers: HashMap<RouteKey, HandlerFunc>,
    // registration order, for route listings
    keys: Vec<RouteKey>,
    policy: DuplicateRoutePolicy,
    not_found: HandlerFunc,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self::with_policy(DuplicateRoutePolicy::default())
    }

    pub fn with_policy(policy: DuplicateRoutePolicy) -> Self {
        Self {
            roots: HashMap::new(),
            handlers: HashMap::new(),
            keys: Vec::new(),
            policy,
            not_found: Arc::new(not_found),
        }
    }

    pub fn policy(&self) -> DuplicateRoutePolicy {
        self.policy
    }

    /// Registers `handler` for `method` and `pattern`.
    ///
    /// Two patterns reaching the same trie slot, such as `/user/:id` and
    /// `/user/:name`, collide even though they are different strings.
    pub fn add_route(&mut self, method: Method, pattern: &str, handler: HandlerFunc) -> Result<(), RouteError> {
        let parts = parse_pattern(pattern);
        if pattern::has_ignored_tail(pattern) {
            warn!(%method, pattern, "segments after the wildcard are ignored");
        }

        let root = self.roots.entry(method.clone()).or_insert_with(Node::root);
        if let Some(existing) = root.terminal(&parts, 0).map(str::to_string) {
            match self.policy {
                DuplicateRoutePolicy::Reject if existing == pattern => {
                    return Err(RouteError::DuplicateRoute { method, pattern: pattern.to_string() });
                }
                DuplicateRoutePolicy::Reject => {
                    return Err(RouteError::ConflictingRoute { method, pattern: pattern.to_string(), existing });
                }
                DuplicateRoutePolicy::Overwrite => {
                    warn!(%method, pattern, existing = existing.as_str(), "route overwritten");
                    let stale = RouteKey::new(method.clone(), existing);
                    self.handlers.remove(&stale);
                    self.keys.retain(|key| key != &stale);
                }
            }
        }

        root.insert(pattern, &parts, 0);

        let key = RouteKey::new(method, pattern);
        debug!(route = %key, "route added");
        self.keys.push(key.clone());
        self.handlers.insert(key, handler);
        Ok(())
    }

    /// Finds the route matching `path` for `method` and binds its parameters.
    ///
    /// A `*name` wildcard binds the rest of the path joined with `/`; a bare `*`
    /// binds nothing.
    pub fn get_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        let parts = split_segments(path);
        let route = self.roots.get(method)?.search(&parts, 0)?.route()?;

        let mut params = PathParams::empty();
        for (index, segment) in route.segments.iter().enumerate() {
            let Some(part) = parts.get(index) else {
                break;
            };
            match segment {
                Segment::Literal(_) => {}
                Segment::Param(name) => params.insert(name.as_str(), *part),
                Segment::Wildcard(Some(name)) => {
                    params.insert(name.as_str(), parts[index..].join("/"));
                    break;
                }
                Segment::Wildcard(None) => break,
            }
        }

        Some(RouteMatch { pattern: &route.pattern, params })
    }

    /// The handler registered for exactly `method` and `pattern`
    pub fn handler(&self, method: &Method, pattern: &str) -> Option<&HandlerFunc> {
        self.handlers.get(&RouteKey::new(method.clone(), pattern))
    }

    /// Appends the handler for the request to the chain and starts running it.
    ///
    /// Requests without a route get a handler answering `404 NOT FOUND: <path>`.
    pub fn handle(&self, c: &mut Context) {
        let found = self.get_route(c.method(), c.path()).and_then(|matched| {
            let handler = self.handler(c.method(), matched.pattern())?;
            Some((Arc::clone(handler), matched.into_params()))
        });

        match found {
            Some((handler, params)) => {
                c.set_params(params);
                c.push_handler(handler);
            }
            None => c.push_handler(Arc::clone(&self.not_found)),
        }

        c.next();
    }

    /// Registered routes in registration order
    pub fn routes(&self) -> impl Iterator<Item = &RouteKey> {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").field("routes", &self.keys).field("policy", &self.policy).finish_non_exhaustive()
    }
}

fn not_found(c: &mut Context) {
    let body = format!("404 NOT FOUND: {}\n", c.path());
    c.string(StatusCode::NOT_FOUND, body);
}
