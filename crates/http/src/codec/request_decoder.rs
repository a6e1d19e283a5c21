//! HTTP request decoder module
//!
//! Decodes a request in two phases, keeping the parsed head between calls while the
//! body is still arriving:
//!
//! 1. Header parsing with `httparse` into a [`RequestHeader`]
//! 2. Body collection, framed by `Content-Length` or `Transfer-Encoding: chunked`,
//!    into a single [`Bytes`]
//!
//! # Limits
//!
//! - Maximum number of headers: 64
//! - Maximum header size: 8KB
//! - Maximum body size: [`DEFAULT_MAX_BODY_SIZE`] unless configured
//! - Only HTTP/1.0 and HTTP/1.1
//!
//! # Example
//!
//! ```no_run
//! use gee_http::codec::RequestDecoder;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = BytesMut::new();
//! // ... add request data to buffer ...
//! let result = decoder.decode(&mut buffer);
//! ```

use bytes::{Buf, Bytes, BytesMut};
use http::{HeaderName, HeaderValue, Request};
use httparse::{Error, Status};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::chunked_decoder::{Chunk, ChunkedDecoder};
use crate::ensure;
use crate::protocol::{BodyFraming, ParseError, RequestHeader};

/// Maximum number of headers allowed in a request
const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes allowed for the entire header section
const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Default upper bound for a request body
pub const DEFAULT_MAX_BODY_SIZE: usize = 4 * 1024 * 1024;

/// A decoder for HTTP requests, buffering the whole body before yielding the request.
///
/// # State Machine
///
/// - `pending == None`: parsing the request head
/// - `pending == Some((header, body))`: collecting the body as framed by the head
#[derive(Debug)]
pub struct RequestDecoder {
    max_body_size: usize,
    pending: Option<(RequestHeader, PendingBody)>,
}

#[derive(Debug)]
enum PendingBody {
    Length(usize),
    Chunked { decoder: ChunkedDecoder, collected: BytesMut },
}

impl RequestDecoder {
    /// Creates a new `RequestDecoder` instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a decoder that rejects bodies larger than `max_body_size` bytes
    pub fn with_max_body_size(max_body_size: usize) -> Self {
        Self { max_body_size, pending: None }
    }

    fn decode_header(&self, src: &mut BytesMut) -> Result<Option<RequestHeader>, ParseError> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
        let mut req = httparse::Request::new(&mut headers);

        let parsed_result = req.parse(src).map_err(|e| match e {
            Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
            e => ParseError::invalid_header(e.to_string()),
        });

        match parsed_result? {
            Status::Complete(body_offset) => {
                trace!(header_size = body_offset, "parsed request header");
                ensure!(body_offset <= MAX_HEADER_BYTES, ParseError::too_large_header(body_offset, MAX_HEADER_BYTES));

                let version = match req.version {
                    Some(0) => http::Version::HTTP_10,
                    Some(1) => http::Version::HTTP_11,
                    // Currently HTTP/2 and HTTP/3 not supported
                    _ => return Err(ParseError::InvalidVersion(req.version)),
                };

                let mut builder = Request::builder()
                    .method(req.method.ok_or(ParseError::InvalidMethod)?)
                    .uri(req.path.ok_or(ParseError::InvalidUri)?)
                    .version(version);

                for header in req.headers.iter() {
                    let name = HeaderName::from_bytes(header.name.as_bytes()).map_err(ParseError::invalid_header)?;
                    let value = HeaderValue::from_bytes(header.value).map_err(ParseError::invalid_header)?;
                    builder = builder.header(name, value);
                }

                // method and uri are validated by the builder here
                let head = builder.body(()).map_err(|e| {
                    if e.is::<http::method::InvalidMethod>() { ParseError::InvalidMethod } else { ParseError::InvalidUri }
                })?;

                src.advance(body_offset);
                Ok(Some(RequestHeader::from(head)))
            }
            // If parsing incomplete, ensure current buffer size does not exceed limit
            Status::Partial => {
                ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
                Ok(None)
            }
        }
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self::with_max_body_size(DEFAULT_MAX_BODY_SIZE)
    }
}

impl Decoder for RequestDecoder {
    type Item = Request<Bytes>;
    type Error = ParseError;

    /// Attempts to decode a complete HTTP request from the provided buffer
    ///
    /// # Returns
    ///
    /// - `Ok(Some(request))`: a request with its whole body
    /// - `Ok(None)`: need more data to proceed
    /// - `Err(_)`: encountered a parsing error
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.pending.is_none() {
            let Some(header) = self.decode_header(src)? else {
                return Ok(None);
            };

            let body = match header.body_framing()? {
                BodyFraming::Length(length) => {
                    ensure!(length <= self.max_body_size, ParseError::too_large_body(length, self.max_body_size));
                    PendingBody::Length(length)
                }
                BodyFraming::Chunked => PendingBody::Chunked { decoder: ChunkedDecoder::new(), collected: BytesMut::new() },
            };
            self.pending = Some((header, body));
        }

        let max_body_size = self.max_body_size;
        let body = match &mut self.pending {
            None => return Ok(None),
            Some((_, PendingBody::Length(length))) => {
                let length = *length;
                if src.len() < length {
                    src.reserve(length - src.len());
                    return Ok(None);
                }
                src.split_to(length).freeze()
            }
            Some((_, PendingBody::Chunked { decoder, collected })) => loop {
                match decoder.decode(src)? {
                    Some(Chunk::Data(data)) => {
                        let size = collected.len() + data.len();
                        ensure!(size <= max_body_size, ParseError::too_large_body(size, max_body_size));
                        collected.extend_from_slice(&data);
                    }
                    Some(Chunk::End) => break collected.split().freeze(),
                    None => return Ok(None),
                }
            },
        };

        Ok(self.pending.take().map(|(header, _)| header.body(body)))
    }
}
