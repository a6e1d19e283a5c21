use crate::Context;
use crate::handler::Handler;
use std::time::Instant;
use tracing::info;

/// Logs the status, request uri and handling time of every request it wraps.
#[derive(Debug, Clone, Copy, Default)]
pub struct Logger;

impl Handler for Logger {
    fn handle(&self, c: &mut Context) {
        let start = Instant::now();
        c.next();
        info!("[{}] {} in {:?}", c.status_code().as_u16(), c.request_uri(), start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::Logger;
    use crate::Context;
    use crate::handler::{HandlerFunc, MockHandler};
    use crate::render::Templates;
    use bytes::Bytes;
    use http::{Request, StatusCode};
    use std::sync::Arc;

    #[test]
    fn test_logger_runs_the_rest_of_the_chain() {
        let mut handler = MockHandler::new();
        handler.expect_handle().times(1).returning(|c| c.string(StatusCode::CREATED, "created"));

        let chain: Vec<HandlerFunc> = vec![Arc::new(Logger), Arc::new(handler)];
        let request = Request::builder().uri("/users?page=2").body(Bytes::new()).unwrap();
        let mut c = Context::new(request, chain, Arc::new(Templates::default()));
        c.next();

        assert_eq!(c.status_code(), StatusCode::CREATED);
        assert!(c.chain().is_finished());
    }
}
