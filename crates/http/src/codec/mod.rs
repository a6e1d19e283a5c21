//! HTTP codec module for encoding and decoding HTTP messages
//!
//! - Request handling:
//!   - [`RequestDecoder`]: decodes a request head and its length-framed or chunked body into `http::Request<Bytes>`
//!
//! - Response handling:
//!   - [`ResponseEncoder`]: encodes `http::Response<Bytes>` with `content-length` and `date` headers
//!
//! # Example
//!
//! ```no_run
//! use gee_http::codec::{RequestDecoder, ResponseEncoder};
//! use tokio_util::codec::{Decoder, Encoder};
//! use bytes::BytesMut;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut request_buffer = BytesMut::from("GET / HTTP/1.1\r\nHost: localhost\r\n\r\n");
//! let request = decoder.decode(&mut request_buffer);
//! ```

mod chunked_decoder;
mod request_decoder;
mod response_encoder;

pub use request_decoder::{DEFAULT_MAX_BODY_SIZE, RequestDecoder};
pub use response_encoder::ResponseEncoder;
