//! HTTP server implementation.

use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, error, info};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::parser::{find_header_end, parse_request, Method};
use crate::server::config::ServerConfig;
use crate::server::error::Error;
use crate::server::handler::Dispatcher;
use crate::server::response::{HttpResponse, StatusCode};

/// Size of a single socket read while collecting the request head.
const READ_CHUNK: usize = 1024;

/// Stops a running [`HttpServer`] from another task.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Ask the server to stop once the request in flight is answered.
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }
}

/// An HTTP server that answers one connection at a time.
pub struct HttpServer {
    /// The server configuration.
    pub config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and dispatcher.
    pub fn new(config: ServerConfig, dispatcher: Dispatcher) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            dispatcher: Arc::new(dispatcher),
            shutdown: Arc::new(shutdown),
        }
    }

    /// A handle that can stop the server from elsewhere.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown.clone(),
        }
    }

    /// Stop the server once the request in flight is answered.
    ///
    /// Calling this before [`HttpServer::serve`] makes `serve` return at once.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener, Error> {
        let listener = TcpListener::bind(self.config.addr).await?;
        info!("Server listening on {url}", url = self.config.url());
        Ok(listener)
    }

    /// Bind the configured address and serve until stopped.
    pub async fn start(&self) -> Result<(), Error> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// Accept and answer connections on `listener`, one at a time, until
    /// [`HttpServer::stop`] is called or Ctrl+C is received.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), Error> {
        let ctrl_c = Self::setup_ctrl_c_handler(self.shutdown_handle());
        let stopped = Self::wait_for_stop(self.shutdown.subscribe());
        tokio::pin!(stopped);

        loop {
            tokio::select! {
                _ = &mut stopped => {
                    info!("Shutting down server...");
                    break;
                }

                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((mut socket, addr)) => {
                            debug!("Connection from {addr}");
                            if let Err(e) = Self::handle_connection(&mut socket, addr, &self.dispatcher, &self.config).await {
                                error!("Error handling connection from {addr}: {e}");
                            }
                            let _ = socket.shutdown().await;
                        }
                        Err(e) => Self::handle_accept_error(e).await,
                    }
                }
            }
        }

        ctrl_c.abort();
        info!("Server shutdown complete");
        Ok(())
    }

    /// Turn Ctrl+C into a stop request.
    fn setup_ctrl_c_handler(handle: ShutdownHandle) -> JoinHandle<()> {
        tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl+C, initiating shutdown");
                    handle.stop();
                }
                Err(e) => {
                    error!("Error setting up Ctrl+C handler: {e}");
                }
            }
        })
    }

    async fn wait_for_stop(mut rx: watch::Receiver<bool>) {
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                // The sender lives as long as the server, so this never fires
                // while serving.
                std::future::pending::<()>().await;
            }
        }
    }

    /// Log a failed accept and back off briefly before the next one.
    async fn handle_accept_error(e: std::io::Error) {
        error!("Error accepting connection: {e}");
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    }

    /// Read the request head, up to and including the blank line.
    ///
    /// Returns `None` when the peer closed the connection without sending
    /// anything.
    async fn read_request_head(
        socket: &mut (impl AsyncRead + Unpin),
        limit: usize,
    ) -> Result<Option<Vec<u8>>, Error> {
        let mut buf = Vec::with_capacity(READ_CHUNK.min(limit));
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            let n = socket.read(&mut chunk).await?;
            if n == 0 {
                return Ok(if buf.is_empty() { None } else { Some(buf) });
            }
            buf.extend_from_slice(&chunk[..n]);

            if find_header_end(&buf).is_some() {
                return Ok(Some(buf));
            }
            if buf.len() >= limit {
                return Err(Error::RequestTooLarge(limit));
            }
        }
    }

    /// Handle a single connection: read one request, answer it, and return.
    ///
    /// Exactly one response is written per request. Errors raised while
    /// handling the request are turned into responses; only failures on the
    /// socket itself are returned.
    pub async fn handle_connection(
        socket: &mut (impl AsyncRead + AsyncWrite + Unpin),
        peer: SocketAddr,
        dispatcher: &Dispatcher,
        config: &ServerConfig,
    ) -> Result<(), Error> {
        let head = match Self::read_request_head(socket, config.read_buffer_size).await {
            Ok(Some(head)) => head,
            Ok(None) => return Ok(()), // Connection closed
            Err(Error::IoError(e)) => return Err(Error::IoError(e)),
            Err(e) => {
                let response = e.to_response(config.expose_error_details);
                return Self::write_response(socket, peer, dispatcher, "-", response).await;
            }
        };

        let (line, is_head, result) = match parse_request(&head) {
            Ok(request) => {
                let line = format!(
                    "{method} {path} {version}",
                    method = request.method,
                    path = request.path,
                    version = request.version
                );
                let is_head = request.method == Method::HEAD;
                (line, is_head, dispatcher.dispatch(request).await)
            }
            Err(e) => {
                let line = String::from_utf8_lossy(&head)
                    .lines()
                    .next()
                    .unwrap_or_default()
                    .to_string();
                (line, false, Err(Error::ParseError(e)))
            }
        };

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                if e.status() == StatusCode::InternalServerError {
                    error!("Error serving \"{line}\": {e}");
                } else {
                    debug!("\"{line}\": {e}");
                }
                e.to_response(config.expose_error_details)
            }
        };
        // HEAD gets the headers a GET would, whichever handler answered.
        let response = if is_head { response.without_body() } else { response };

        Self::write_response(socket, peer, dispatcher, &line, response).await
    }

    /// Finalize the response, log the access line and send it.
    async fn write_response(
        socket: &mut (impl AsyncWrite + Unpin),
        peer: SocketAddr,
        dispatcher: &Dispatcher,
        line: &str,
        response: HttpResponse,
    ) -> Result<(), Error> {
        let response = dispatcher.finalize(response.with_header("Connection", "close"));
        info!("{peer} \"{line}\" {status}", status = response.status.as_u16());

        socket.write_all(&response.to_bytes()).await?;
        socket.flush().await?;
        Ok(())
    }
}
