//! Request routing: map exact URL paths and HTTP methods to handler functions.
//!
//! The lookup service only exposes fixed paths, so routes are matched on the
//! literal path. Trailing slashes are normalized on both routes and incoming
//! paths, so `/hc/` and `/hc` are treated as equivalent.
//!
//! When no route matches the path a `404 Not Found` is returned; when the path
//! is known but not for the request's method a `405 Method Not Allowed` is
//! returned with an `Allow` header listing the registered methods.

use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::{Method, Response, StatusCode};

/// Type-erased, heap-allocated async handler that processes a [`Context`] and returns a
/// [`Response`].
///
/// Handlers are stored behind `Arc<dyn Fn(…)>` so they can be cloned and shared across
/// connection tasks without copying the underlying closure. Use [`Router::get`] and
/// [`Router::post`] rather than constructing this type directly.
pub type Handler =
    Arc<dyn Fn(Context) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync + 'static>;

/// Conversion trait for async handler functions.
///
/// Any `Fn(Context) -> impl Future<Output = Response> + Send` that is also
/// `Send + Sync + 'static` implements this trait automatically via the blanket impl
/// below.
pub trait IntoHandler: Send + Sync + 'static {
    /// Call the handler with the given context, boxing the returned future.
    fn call(&self, ctx: Context) -> Pin<Box<dyn Future<Output = Response> + Send>>;
}

impl<T, F> IntoHandler for T
where
    T: Fn(Context) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    fn call(&self, ctx: Context) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        Box::pin((self)(ctx))
    }
}

// A single registered route binding a method + normalized path to a handler.
struct Route {
    method: Method,
    path: String,
    handler: Handler,
}

/// HTTP request router that dispatches requests to registered handler functions.
///
/// Routes are evaluated in registration order; the first route whose method and
/// path both match wins.
///
/// # Examples
///
/// ```rust,no_run
/// use product_lookup::{Router, Response, StatusCode};
///
/// let mut router = Router::new();
/// router.get("/hc", |_ctx| async { Response::new(StatusCode::Ok) });
/// ```
pub struct Router {
    routes: Vec<Route>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Create a new, empty `Router` with no registered routes.
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Register a handler for `GET` requests to `path`.
    pub fn get(&mut self, path: &str, handler: impl IntoHandler) {
        self.add_route(Method::Get, path, handler);
    }

    /// Register a handler for `POST` requests to `path`.
    pub fn post(&mut self, path: &str, handler: impl IntoHandler) {
        self.add_route(Method::Post, path, handler);
    }

    // Erase the concrete handler type and store it as a `Handler` trait object.
    fn add_route(&mut self, method: Method, path: &str, handler: impl IntoHandler) {
        let handler: Handler = Arc::new(move |ctx| handler.call(ctx));
        self.routes.push(Route {
            method,
            path: normalize(path).to_owned(),
            handler,
        });
    }

    /// Return the number of routes registered in this router.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Return `true` if no routes have been registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Dispatch the request in `ctx` to the first matching route.
    ///
    /// Returns `404 Not Found` for an unknown path and `405 Method Not Allowed`
    /// (with `Allow`) for a known path requested with another method.
    pub async fn route(&self, ctx: Context) -> Response {
        let path = normalize(ctx.request().path()).to_owned();
        let method = ctx.request().method().clone();

        let mut allowed: Vec<&str> = Vec::new();
        for route in self.routes.iter().filter(|r| r.path == path) {
            if route.method == method {
                let handler = Arc::clone(&route.handler);
                return handler(ctx).await;
            }
            allowed.push(route.method.as_str());
        }

        if allowed.is_empty() {
            Response::text(StatusCode::NotFound, "404 page not found")
        } else {
            Response::new(StatusCode::MethodNotAllowed).header("Allow", allowed.join(", "))
        }
    }
}

fn normalize(path: &str) -> &str {
    if path != "/" && path.ends_with('/') {
        &path[..path.len() - 1]
    } else {
        path
    }
}
