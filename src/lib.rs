//! A tiny static file server for local development.
//!
//! Files are served from a root directory (the working directory by default)
//! over plain HTTP/1.1, one connection at a time. Behavior is assembled from a
//! [`Dispatcher`]: an ordered list of [`Rule`]s in front of a generic static
//! file responder, plus headers injected into every response.
//!
//! Two presets cover the shipped binaries:
//!
//! - [`cors_dispatcher`] adds `Access-Control-Allow-Origin: *` to every
//!   response.
//! - [`video_dispatcher`] answers `GET *.mp4` with the whole file, an explicit
//!   `video/mp4` content type and `Cache-Control: no-cache`.
//!
//! # Examples
//!
//! ```no_run
//! use devserve::{cors_dispatcher, HttpServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), devserve::ServerError> {
//!     let config = ServerConfig::default();
//!     let server = HttpServer::new(config.clone(), cors_dispatcher(&config.root));
//!     server.start().await
//! }
//! ```
//!
//! Custom rules are added the same way the presets add theirs:
//!
//! ```
//! use devserve::{static_dispatcher, HttpResponse, Method, Rule, StatusCode};
//!
//! let dispatcher = static_dispatcher(".").with_rule(Rule::suffix(".txt", vec![Method::GET], |_req| async {
//!     Ok(HttpResponse::new(StatusCode::Ok).with_body_string("plain"))
//! }));
//! assert_eq!(dispatcher.rules().len(), 1);
//! ```

pub mod parser;
pub mod presets;
pub mod server;

// Re-export commonly used items for convenience
pub use parser::{parse_request, Error as ParserError, HttpRequest, HttpVersion, Method};
pub use presets::{cors_dispatcher, static_dispatcher, video_dispatcher};
pub use server::{
    Dispatcher, Error as ServerError, HttpResponse, HttpServer, Rule, ServerConfig, ShutdownHandle, StaticFiles,
    StatusCode,
};
