use crate::Context;
use std::sync::Arc;

/// A link of the request chain: a middleware or a route handler.
///
/// Middlewares call [`Context::next`] to run the rest of the chain and may do work
/// before and after it. Not calling it stops the chain.
///
/// Any `Fn(&mut Context)` is a handler:
///
/// ```
/// use gee_web::{Context, Handler};
/// use http::StatusCode;
///
/// fn assert_handler<H: Handler>(_h: H) {}
///
/// assert_handler(|c: &mut Context| {
///     let name = c.param("name").unwrap_or("guest").to_string();
///     c.string(StatusCode::OK, format!("hello {name}\n"));
/// });
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait Handler: Send + Sync {
    fn handle(&self, c: &mut Context);
}

impl<F> Handler for F
where
    F: Fn(&mut Context) + Send + Sync,
{
    #[inline]
    fn handle(&self, c: &mut Context) {
        (self)(c)
    }
}

/// A shared, type-erased handler, as stored in the route table and in groups
pub type HandlerFunc = Arc<dyn Handler>;
