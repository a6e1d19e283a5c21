//! Middlewares shipped with gee.
//!
//! Both are plain [`Handler`](crate::Handler)s and are installed with
//! `use_middleware`, usually on the engine so that they wrap every request.

mod logger;
mod recovery;

pub use logger::Logger;
pub use recovery::Recovery;
pub(crate) use recovery::panic_message;
