use bytes::{BufMut, Bytes, BytesMut};
use http::header::{CONTENT_LENGTH, DATE};
use http::{Response, Version};
use tokio_util::codec::Encoder;

use crate::protocol::SendError;

/// Size reserved up front for the status line and headers
const INIT_HEADER_SIZE: usize = 4 * 1024;

/// Encodes a buffered response as an HTTP/1.1 message.
///
/// `content-length` is always derived from the body, any value set by the
/// handler is replaced. A `date` header is added unless the response has one.
///
/// While [`ResponseEncoder::omit_body`] is set, the body is measured for
/// `content-length` but not written, as a response to `HEAD` requires.
#[derive(Debug, Default)]
pub struct ResponseEncoder {
    omit_body: bool,
}

impl ResponseEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the next responses are sent without their body
    pub fn omit_body(&mut self, omit_body: bool) {
        self.omit_body = omit_body;
    }
}

impl Encoder<Response<Bytes>> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, item: Response<Bytes>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (parts, body) = item.into_parts();

        if parts.version != Version::HTTP_11 && parts.version != Version::HTTP_10 {
            return Err(SendError::invalid_header(format!("unsupported response version {:?}", parts.version)));
        }

        let body_size = if self.omit_body { 0 } else { body.len() };
        dst.reserve(INIT_HEADER_SIZE + body_size);

        dst.put_slice(b"HTTP/1.1 ");
        dst.put_slice(parts.status.as_str().as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(parts.status.canonical_reason().unwrap_or("").as_bytes());
        dst.put_slice(b"\r\n");

        for (name, value) in parts.headers.iter() {
            if name == CONTENT_LENGTH {
                continue;
            }
            dst.put_slice(name.as_str().as_bytes());
            dst.put_slice(b": ");
            dst.put_slice(value.as_bytes());
            dst.put_slice(b"\r\n");
        }

        if !parts.headers.contains_key(DATE) {
            let mut date = faf_http_date::get_date_buff_no_key();
            faf_http_date::get_date_no_key(&mut date);
            dst.put_slice(b"date: ");
            dst.put_slice(&date);
            dst.put_slice(b"\r\n");
        }

        dst.put_slice(b"content-length: ");
        dst.put_slice(body.len().to_string().as_bytes());
        dst.put_slice(b"\r\n\r\n");
        if !self.omit_body {
            dst.put_slice(&body);
        }

        Ok(())
    }
}
