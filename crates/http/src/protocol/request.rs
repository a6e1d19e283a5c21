//! HTTP request header handling.
//!
//! Wraps a bodyless `http::Request<()>` produced by the header parser and answers
//! the framing questions the decoder and the connection need: how the body is
//! delimited and whether the connection survives the exchange.

use bytes::Bytes;
use http::header::{CONNECTION, CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderMap, Method, Request, Uri, Version};

use crate::protocol::ParseError;

/// How a request body is delimited on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFraming {
    /// Exactly this many bytes follow the header
    Length(usize),
    /// `Transfer-Encoding: chunked`
    Chunked,
}

/// The head of a request: method, uri, version and headers.
#[derive(Debug)]
pub struct RequestHeader {
    inner: Request<()>,
}

impl RequestHeader {
    /// Consumes the header and returns the inner `Request<()>`.
    pub fn into_inner(self) -> Request<()> {
        self.inner
    }

    /// Attaches the fully read body, producing the request handed to a [`crate::handler::Handler`].
    pub fn body(self, body: Bytes) -> Request<Bytes> {
        self.inner.map(|()| body)
    }

    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    pub fn version(&self) -> Version {
        self.inner.version()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// How the body following the header is framed.
    ///
    /// `Transfer-Encoding: chunked` wins over any `Content-Length`. Other transfer
    /// codings, including `chunked` stacked on a compression, are rejected. Without
    /// either header the body is empty.
    pub fn body_framing(&self) -> Result<BodyFraming, ParseError> {
        if let Some(encoding) = self.headers().get(TRANSFER_ENCODING) {
            let is_chunked = encoding.to_str().is_ok_and(|coding| coding.trim().eq_ignore_ascii_case("chunked"));
            if !is_chunked {
                let encoding = String::from_utf8_lossy(encoding.as_bytes());
                return Err(ParseError::unsupported_transfer_encoding(encoding));
            }
            return Ok(BodyFraming::Chunked);
        }

        let mut lengths = self.headers().get_all(CONTENT_LENGTH).iter();
        let Some(value) = lengths.next() else {
            return Ok(BodyFraming::Length(0));
        };

        let length = value
            .to_str()
            .map_err(ParseError::invalid_content_length)?
            .trim()
            .parse::<usize>()
            .map_err(ParseError::invalid_content_length)?;

        // repeated content-length headers must agree
        for other in lengths {
            if other.as_bytes() != value.as_bytes() {
                return Err(ParseError::invalid_content_length("conflicting content-length headers"));
            }
        }

        Ok(BodyFraming::Length(length))
    }
}

impl From<Request<()>> for RequestHeader {
    #[inline]
    fn from(inner: Request<()>) -> Self {
        Self { inner }
    }
}

/// Whether the connection stays open after answering a request with these headers.
///
/// HTTP/1.1 defaults to keep-alive unless `Connection: close`; HTTP/1.0 closes
/// unless `Connection: keep-alive`.
pub fn is_keep_alive(version: Version, headers: &HeaderMap) -> bool {
    let connection = headers.get(CONNECTION).map(|value| value.as_bytes());
    match version {
        Version::HTTP_11 => !connection.is_some_and(|value| value.eq_ignore_ascii_case(b"close")),
        Version::HTTP_10 => connection.is_some_and(|value| value.eq_ignore_ascii_case(b"keep-alive")),
        _ => false,
    }
}
