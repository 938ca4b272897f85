//! HTTP request parsing.
//!
//! Only the request line and header block are parsed. Request bodies are
//! ignored since the file server never reads them.

mod request;
mod method;
mod version;
mod error;

// Re-export public items
pub use request::HttpRequest;
pub use method::Method;
pub use version::HttpVersion;
pub use error::Error;

pub use request::{find_header_end, parse_request};
