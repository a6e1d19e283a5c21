//! HTTP connection handling module
//!
//! - [`HttpConnection`]: drives one TCP connection:
//!   - Decodes requests with [`crate::codec::RequestDecoder`]
//!   - Dispatches each request to a [`crate::handler::Handler`]
//!   - Encodes responses with [`crate::codec::ResponseEncoder`]
//!   - Keeps the connection alive between requests when the client allows it

mod http_connection;

pub use http_connection::HttpConnection;
