//! Core HTTP protocol types shared by the codec and the connection.
//!
//! - **Request Processing** ([`request`]): the parsed request head
//!   - [`RequestHeader`]: method, uri, version and headers before the body is attached
//!   - [`BodyFraming`]: whether the body is length-delimited or chunked
//!   - [`is_keep_alive`]: connection persistence rules for HTTP/1.0 and HTTP/1.1
//!
//! - **Error Handling** ([`error`]):
//!   - [`HttpError`]: Top-level error type
//!   - [`ParseError`]: Request parsing errors
//!   - [`SendError`]: Response sending errors

mod request;
pub use request::BodyFraming;
pub use request::RequestHeader;
pub use request::is_keep_alive;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
