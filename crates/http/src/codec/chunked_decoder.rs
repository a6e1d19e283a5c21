//! Decoder for `Transfer-Encoding: chunked` request bodies.
//!
//! Each chunk is a hex size line, optionally followed by `;extensions`, then the
//! chunk data and a CRLF. A zero-sized chunk ends the body, after which trailer
//! fields may follow up to an empty line. Extensions and trailers are skipped.

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::protocol::ParseError;

/// One step of a chunked body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Chunk {
    Data(Bytes),
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Size,
    SizeLws,
    Extension,
    SizeLf,
    Data,
    DataCr,
    DataLf,
    Trailer,
    TrailerLf,
    EndCr,
    EndLf,
    Done,
}

#[derive(Debug)]
pub(crate) struct ChunkedDecoder {
    state: State,
    remaining: u64,
}

impl ChunkedDecoder {
    pub(crate) fn new() -> Self {
        Self { state: State::Size, remaining: 0 }
    }

    fn next_state(&mut self, byte: u8) -> Result<State, ParseError> {
        use State::*;

        let next = match (self.state, byte) {
            (Size, b'\t' | b' ') => SizeLws,
            (Size, b';') => Extension,
            (Size, b'\r') => SizeLf,
            (Size, b) => {
                let digit = hex_value(b).ok_or_else(|| ParseError::invalid_chunk("invalid chunk size"))?;
                self.remaining = self
                    .remaining
                    .checked_mul(16)
                    .and_then(|size| size.checked_add(u64::from(digit)))
                    .ok_or_else(|| ParseError::invalid_chunk("chunk size overflow"))?;
                Size
            }
            (SizeLws, b'\t' | b' ') => SizeLws,
            (SizeLws, b';') => Extension,
            (SizeLws, b'\r') => SizeLf,
            (Extension, b'\r') => SizeLf,
            (Extension, b'\n') => return Err(ParseError::invalid_chunk("newline in chunk extension")),
            (Extension, _) => Extension,
            (SizeLf, b'\n') if self.remaining == 0 => EndCr,
            (SizeLf, b'\n') => Data,
            (DataCr, b'\r') => DataLf,
            (DataLf, b'\n') => Size,
            (Trailer, b'\r') => TrailerLf,
            (Trailer, _) => Trailer,
            (TrailerLf, b'\n') => EndCr,
            (EndCr, b'\r') => EndLf,
            (EndCr, _) => Trailer,
            (EndLf, b'\n') => Done,
            (state, b) => return Err(ParseError::invalid_chunk(format!("unexpected byte {b:#04x} in {state:?}"))),
        };
        Ok(next)
    }
}

impl Decoder for ChunkedDecoder {
    type Item = Chunk;
    type Error = ParseError;

    /// Returns the data available for the current chunk, [`Chunk::End`] once the
    /// terminating chunk and trailers are consumed, or `None` when more bytes are needed.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                State::Done => return Ok(Some(Chunk::End)),
                State::Data => {
                    if src.is_empty() {
                        return Ok(None);
                    }
                    let size = usize::try_from(self.remaining).unwrap_or(usize::MAX).min(src.len());
                    self.remaining -= size as u64;
                    if self.remaining == 0 {
                        self.state = State::DataCr;
                    }
                    trace!(size, "read chunk data");
                    return Ok(Some(Chunk::Data(src.split_to(size).freeze())));
                }
                _ => {
                    if !src.has_remaining() {
                        return Ok(None);
                    }
                    let byte = src.get_u8();
                    self.state = self.next_state(byte)?;
                }
            }
        }
    }
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{Chunk, ChunkedDecoder};
    use bytes::{Bytes, BytesMut};
    use tokio_util::codec::Decoder;

    fn collect(decoder: &mut ChunkedDecoder, src: &mut BytesMut) -> (Vec<u8>, bool) {
        let mut body = vec![];
        while let Some(chunk) = decoder.decode(src).unwrap() {
            match chunk {
                Chunk::Data(data) => body.extend_from_slice(&data),
                Chunk::End => return (body, true),
            }
        }
        (body, false)
    }

    #[test]
    fn multiple_chunks() {
        let mut src = BytesMut::from("5\r\nhello\r\n7\r\n, world\r\n0\r\n\r\nGET");
        let (body, finished) = collect(&mut ChunkedDecoder::new(), &mut src);

        assert!(finished);
        assert_eq!(body, b"hello, world");
        // bytes of the next request are left alone
        assert_eq!(&src[..], b"GET");
    }

    #[test]
    fn extensions_and_trailers_are_skipped() {
        let mut src = BytesMut::from("A;name=value\r\n0123456789\r\n0\r\nExpires: never\r\n\r\n");
        let (body, finished) = collect(&mut ChunkedDecoder::new(), &mut src);

        assert!(finished);
        assert_eq!(body, b"0123456789");
    }

    #[test]
    fn data_arrives_in_parts() {
        let mut decoder = ChunkedDecoder::new();
        let mut src = BytesMut::from("5\r\nhel");

        assert_eq!(decoder.decode(&mut src).unwrap(), Some(Chunk::Data(Bytes::from_static(b"hel"))));
        assert_eq!(decoder.decode(&mut src).unwrap(), None);

        src.extend_from_slice(b"lo\r\n0\r\n");
        assert_eq!(decoder.decode(&mut src).unwrap(), Some(Chunk::Data(Bytes::from_static(b"lo"))));
        assert_eq!(decoder.decode(&mut src).unwrap(), None);

        src.extend_from_slice(b"\r\n");
        assert_eq!(decoder.decode(&mut src).unwrap(), Some(Chunk::End));
    }

    #[test]
    fn invalid_size() {
        let mut src = BytesMut::from("xyz\r\n");
        assert!(ChunkedDecoder::new().decode(&mut src).is_err());
    }

    #[test]
    fn size_overflow() {
        let mut src = BytesMut::from("fffffffffffffffff\r\n");
        assert!(ChunkedDecoder::new().decode(&mut src).is_err());
    }

    #[test]
    fn missing_crlf_after_data() {
        let mut decoder = ChunkedDecoder::new();
        let mut src = BytesMut::from("5\r\nhelloXX");

        assert_eq!(decoder.decode(&mut src).unwrap(), Some(Chunk::Data(Bytes::from_static(b"hello"))));
        assert!(decoder.decode(&mut src).is_err());
    }
}
