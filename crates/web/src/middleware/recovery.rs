use crate::Context;
use crate::handler::Handler;
use http::StatusCode;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::error;

/// Turns a panic in the rest of the chain into `500 Internal Server Error`.
///
/// Only handlers running after `Recovery` are covered, so it is usually the first
/// middleware installed on the engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct Recovery;

impl Handler for Recovery {
    fn handle(&self, c: &mut Context) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| c.next())) {
            error!(cause = panic_message(&*payload), uri = c.request_uri(), "recovered from handler panic");
            c.reset_response();
            c.fail(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
