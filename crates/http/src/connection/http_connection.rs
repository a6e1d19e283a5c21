use std::error::Error;
use std::sync::Arc;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use http::header::CONNECTION;
use http::{HeaderValue, Method, Response, StatusCode};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, error, info};

use crate::codec::{RequestDecoder, ResponseEncoder};
use crate::handler::Handler;
use crate::protocol::{HttpError, is_keep_alive};

/// An HTTP connection that reads requests, dispatches them to a [`Handler`] and writes
/// the responses back, one exchange at a time.
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
#[derive(Debug)]
pub struct HttpConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    framed_write: FramedWrite<W, ResponseEncoder>,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_decoder(reader, writer, RequestDecoder::new())
    }

    /// Builds a connection with a customised decoder, e.g. a different body size limit
    pub fn with_decoder(reader: R, writer: W, decoder: RequestDecoder) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, decoder, 8 * 1024),
            framed_write: FramedWrite::new(writer, ResponseEncoder::new()),
        }
    }

    pub async fn process<H>(mut self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler,
    {
        loop {
            match self.framed_read.next().await {
                Some(Ok(request)) => {
                    let keep_alive = is_keep_alive(request.version(), request.headers());
                    let is_head = request.method() == Method::HEAD;
                    debug!(method = %request.method(), uri = %request.uri(), keep_alive, "receive request");

                    let mut response = match handler.call(request).await {
                        Ok(response) => response,
                        Err(e) => {
                            let cause: Box<dyn Error + Send + Sync> = e.into();
                            error!("handle response error, cause: {}", cause);
                            build_error_response(StatusCode::INTERNAL_SERVER_ERROR)
                        }
                    };

                    if !keep_alive {
                        response.headers_mut().insert(CONNECTION, HeaderValue::from_static("close"));
                    }

                    // a HEAD response announces the body length but carries no body
                    self.framed_write.encoder_mut().omit_body(is_head);
                    self.framed_write.send(response).await?;

                    if !keep_alive {
                        info!("connection not keep-alive, shutdown");
                        return Ok(());
                    }
                }

                Some(Err(e)) => {
                    error!("can't receive next request, cause {}", e);
                    let mut error_response = build_error_response(StatusCode::BAD_REQUEST);
                    error_response.headers_mut().insert(CONNECTION, HeaderValue::from_static("close"));
                    self.framed_write.encoder_mut().omit_body(false);
                    self.framed_write.send(error_response).await?;
                    return Err(e.into());
                }

                None => {
                    info!("cant read more request, break this connection down");
                    return Ok(());
                }
            }
        }
    }
}

fn build_error_response(status_code: StatusCode) -> Response<Bytes> {
    let mut response = Response::new(Bytes::new());
    *response.status_mut() = status_code;
    response
}
