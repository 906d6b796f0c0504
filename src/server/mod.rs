//! Async TCP server using Tokio.
//!
//! Accepts TCP connections and dispatches HTTP/1.1 requests through a
//! middleware [`Stack`]. Each connection is served on its own task; requests
//! on a keep-alive connection are served in order.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::{Buf, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::context::Context;
use crate::http::{
    StatusCode,
    request::{Request, RequestError},
    response::Response,
};
use crate::middleware::Stack;

/// Errors produced by the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Maximum size of a complete HTTP request we will buffer before rejecting it (1 MiB).
const MAX_REQUEST_SIZE: usize = 1024 * 1024;

/// Initial read buffer capacity per connection.
const INITIAL_BUF_SIZE: usize = 4096;

/// The HTTP server the lookup service is exposed on.
///
/// # Examples
///
/// ```rust,no_run
/// use product_lookup::server::Server;
/// use product_lookup::middleware::Pipeline;
/// use product_lookup::Router;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let server = Server::bind("127.0.0.1:8080").await?;
///     server.run(Pipeline::new(Router::new()).build()).await?;
///     Ok(())
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Server {
    /// Binds the server to the given TCP address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound
    /// (e.g. port already in use, insufficient permissions).
    pub async fn bind(addr: impl AsRef<str>) -> Result<Self, ServerError> {
        let addr = addr.as_ref();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.to_owned(),
                source: e,
            })?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts connections forever, dispatching every request through `stack`.
    pub async fn run(self, stack: Arc<Stack>) -> Result<(), ServerError> {
        self.run_until(stack, std::future::pending()).await
    }

    /// Accepts connections until `shutdown` resolves.
    ///
    /// In-flight connections are left to finish on their own tasks; only the
    /// accept loop stops.
    pub async fn run_until(
        self,
        stack: Arc<Stack>,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), ServerError> {
        info!(address = %self.local_addr, "lookup service listening");
        tokio::pin!(shutdown);

        loop {
            let accepted = tokio::select! {
                accepted = self.listener.accept() => accepted,
                () = &mut shutdown => {
                    info!("shutdown requested, no longer accepting connections");
                    return Ok(());
                }
            };

            let (stream, peer_addr) = match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            debug!(peer = %peer_addr, "connection accepted");
            let stack = Arc::clone(&stack);

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, peer_addr, stack).await {
                    warn!(peer = %peer_addr, error = %e, "connection closed with error");
                }
            });
        }
    }
}

/// Serves one TCP connection until the peer closes it or asks for `Connection: close`.
async fn handle_connection(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    stack: Arc<Stack>,
) -> Result<(), std::io::Error> {
    let mut buf = BytesMut::with_capacity(INITIAL_BUF_SIZE);

    loop {
        // Pipelined bytes from the previous round may already hold a request.
        let parsed = if buf.is_empty() {
            Err(RequestError::Incomplete)
        } else {
            Request::parse(&buf, MAX_REQUEST_SIZE)
        };

        let (request, consumed) = match parsed {
            Ok(pair) => pair,
            Err(RequestError::Incomplete) => {
                if buf.len() > MAX_REQUEST_SIZE {
                    warn!(peer = %peer_addr, "request too large, sending 413");
                    reject(&mut stream, StatusCode::PayloadTooLarge, "request entity too large")
                        .await?;
                    break;
                }
                if stream.read_buf(&mut buf).await? == 0 {
                    debug!(peer = %peer_addr, "connection closed by peer");
                    break;
                }
                continue;
            }
            Err(e @ RequestError::TooLarge { .. }) => {
                warn!(peer = %peer_addr, error = %e, "request too large, sending 413");
                reject(&mut stream, StatusCode::PayloadTooLarge, e.to_string()).await?;
                break;
            }
            Err(e) => {
                warn!(peer = %peer_addr, error = %e, "bad request, sending 400");
                reject(&mut stream, StatusCode::BadRequest, format!("bad request: {e}")).await?;
                break;
            }
        };

        buf.advance(consumed);
        let keep_alive = request.is_keep_alive();

        debug!(
            peer = %peer_addr,
            method = %request.method(),
            path = %request.path(),
            "dispatching request"
        );

        let response = stack
            .dispatch(Context::with_peer(request, peer_addr))
            .await
            .keep_alive(keep_alive);
        stream.write_all(&response.into_bytes()).await?;
        stream.flush().await?;

        if !keep_alive {
            debug!(peer = %peer_addr, "Connection: close, shutting down");
            break;
        }
    }

    Ok(())
}

async fn reject(
    stream: &mut TcpStream,
    status: StatusCode,
    message: impl Into<String>,
) -> Result<(), std::io::Error> {
    let response = Response::text(status, message).keep_alive(false);
    stream.write_all(&response.into_bytes()).await?;
    stream.flush().await
}
