//! The file server: configuration, responses, dispatch and the accept loop.

mod response;
mod config;
mod error;
mod handler;
mod http_server;
mod static_files;
mod video;

// Re-export public items
pub use response::{HttpResponse, StatusCode};
pub use config::ServerConfig;
pub use error::Error;
pub use handler::{handler_fn, Dispatcher, HandlerFn, HandlerFuture, PredicateFn, Rule};
pub use http_server::{HttpServer, ShutdownHandle};
pub use static_files::{translate_path, StaticFiles};
pub use video::{serve_video, video_rule, VIDEO_CONTENT_TYPE, VIDEO_SUFFIX};
