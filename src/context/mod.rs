//! Per-request context handed to route handlers and middleware.

use std::net::SocketAddr;

use crate::Request;
use crate::http::{Form, FormError};

/// Per-request context: the parsed request plus connection metadata.
///
/// One `Context` is created per request and moved through the middleware
/// chain into the handler; nothing in it is shared with other requests.
#[derive(Debug)]
pub struct Context {
    request: Request,
    peer: Option<SocketAddr>,
}

impl Context {
    /// Create a context for a request with no known peer address.
    pub fn new(request: Request) -> Self {
        Self {
            request,
            peer: None,
        }
    }

    /// Create a context for a request received from `peer`.
    pub fn with_peer(request: Request, peer: SocketAddr) -> Self {
        Self {
            request,
            peer: Some(peer),
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Decode the request's form values (URL-encoded body, then query string).
    pub fn form(&self) -> Result<Form, FormError> {
        Form::from_request(&self.request)
    }
}
