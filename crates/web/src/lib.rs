//! A tiny web framework built on [`gee_http`].
//!
//! Routes are matched by a prefix tree per HTTP method supporting `:param` and
//! `*wildcard` segments. Groups share a path prefix and a list of middlewares, and
//! every request runs through the middlewares of the groups its path starts with,
//! then the matched handler:
//!
//! ```no_run
//! use gee_web::middleware::{Logger, Recovery};
//! use gee_web::{Context, Engine};
//! use http::StatusCode;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::new();
//!     engine.use_middleware(Recovery).use_middleware(Logger);
//!
//!     let mut v1 = engine.group("/v1");
//!     v1.get("/hello/:name", |c: &mut Context| {
//!         let body = format!("hello {}\n", c.param("name").unwrap_or_default());
//!         c.string(StatusCode::OK, body);
//!     })?;
//!     v1.get("/assets/*filepath", |c: &mut Context| {
//!         let filepath = c.param("filepath").unwrap_or_default().to_string();
//!         c.json(StatusCode::OK, &serde_json::json!({ "filepath": filepath }));
//!     })?;
//!
//!     engine.run("127.0.0.1:9999").await?;
//!     Ok(())
//! }
//! ```

mod chain;
mod context;
mod engine;
mod group;
mod handler;
mod render;
mod server;

pub mod middleware;
pub mod router;

pub use chain::Chain;
pub use context::Context;
pub use engine::Engine;
pub use engine::EngineConfig;
pub use group::RouterGroup;
pub use handler::Handler;
pub use handler::HandlerFunc;
pub use render::TemplateError;
pub use render::Templates;
pub use router::PathParams;
pub use router::Router;
pub use server::Server;
pub use server::ServerBuildError;
pub use server::ServerBuilder;
pub use server::ServerConfig;
pub use server::ServerError;
