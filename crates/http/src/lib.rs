//! The HTTP/1.1 wire layer of the gee web framework.
//!
//! This crate turns a byte stream into `http::Request<Bytes>` values, hands them to a
//! [`handler::Handler`] and writes the resulting `http::Response<Bytes>` back. Request
//! bodies, framed by `Content-Length` or chunked, are buffered whole, so a router can
//! run its entire middleware chain synchronously on a fully read request.
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use http::{Request, Response};
//! use std::convert::Infallible;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use tracing::{error, info, warn};
//! use gee_http::connection::HttpConnection;
//! use gee_http::handler::make_handler;
//!
//! #[tokio::main]
//! async fn main() {
//!     let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
//!         Ok(tcp_listener) => tcp_listener,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     let handler = Arc::new(make_handler(hello_world));
//!
//!     loop {
//!         let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
//!             Ok(stream_and_addr) => stream_and_addr,
//!             Err(e) => {
//!                 warn!(cause = %e, "failed to accept");
//!                 continue;
//!             }
//!         };
//!
//!         let handler = handler.clone();
//!
//!         tokio::spawn(async move {
//!             let (reader, writer) = tcp_stream.into_split();
//!             let connection = HttpConnection::new(reader, writer);
//!             if let Err(e) = connection.process(handler).await {
//!                 error!("service has error, cause {}, connection shutdown", e);
//!             }
//!         });
//!     }
//! }
//!
//! async fn hello_world(request: Request<Bytes>) -> Result<Response<Bytes>, Infallible> {
//!     info!("request path {}", request.uri().path());
//!     Ok(Response::new(Bytes::from_static(b"Hello World!\r\n")))
//! }
//! ```
//!
//! # Architecture
//!
//! - [`connection`]: connection lifecycle and keep-alive
//! - [`protocol`]: request head and error types
//! - [`codec`]: request decoding and response encoding
//! - [`handler`]: the request handler trait
//!
//! # Limitations
//!
//! - HTTP/1.1 and HTTP/1.0 only
//! - Chunked is the only transfer coding accepted on requests
//! - Maximum header size: 8KB
//! - Maximum number of headers: 64

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
