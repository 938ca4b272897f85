//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The address to bind to.
    pub addr: SocketAddr,
    /// The directory files are served from.
    pub root: PathBuf,
    /// The maximum size of a request head, in bytes.
    pub read_buffer_size: usize,
    /// Whether 500 responses carry the underlying error message in their body.
    pub expose_error_details: bool,
}

impl ServerConfig {
    /// The URL announced in the startup banner.
    ///
    /// Loopback addresses are shown as `localhost`.
    pub fn url(&self) -> String {
        if self.addr.ip().is_loopback() {
            format!("http://localhost:{port}", port = self.addr.port())
        } else {
            format!("http://{addr}", addr = self.addr)
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8000)),
            root: PathBuf::from("."),
            read_buffer_size: 8192,
            expose_error_details: true,
        }
    }
}
