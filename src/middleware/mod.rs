//! Middleware pipeline: composable before/after logic around the router.
//!
//! Each middleware wraps the next layer and may inspect the request or
//! answer it early before the router is reached.
//!
//! ## Core types
//!
//! - [`Middleware`]: trait implemented by all middleware.
//! - [`Next`]: cursor into the remaining chain; call [`Next::run`] to advance.
//!   Once the chain is exhausted the request is dispatched to the [`Router`].
//! - [`Pipeline`]: an ordered middleware stack in front of a router; this is
//!   what the server runs.
//! - [`LoggerMiddleware`]: request/response logger.

use std::{future::Future, pin::Pin, sync::Arc};
use tokio::time::Instant;

use crate::{Request, Response, context::Context, router::Router};

/// A type-erased, reference-counted middleware function.
pub type MiddlewareHandler = Arc<
    dyn Fn(Context, Next) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync + 'static,
>;

/// Converts a [`Middleware`] implementation into a [`MiddlewareHandler`].
pub fn from_middleware<M>(middleware: Arc<M>) -> MiddlewareHandler
where
    M: Middleware + 'static,
{
    Arc::new(move |ctx: Context, next: Next| middleware.handle(ctx, next))
}

/// A cursor into the remaining middleware chain for a single request.
///
/// `Next` is consumed on each call to [`run`](Self::run), so it cannot be
/// called more than once per middleware invocation.
pub struct Next {
    middlewares: Arc<[MiddlewareHandler]>,
    // Tracks which middleware to invoke on the next `run` call.
    index: usize,
    endpoint: Arc<Router>,
}

impl Next {
    /// Invokes the next middleware in the chain, or the router once every
    /// middleware has run.
    pub async fn run(mut self, ctx: Context) -> Response {
        if self.index < self.middlewares.len() {
            let handler = Arc::clone(&self.middlewares[self.index]);
            self.index += 1;
            handler(ctx, self).await
        } else {
            self.endpoint.route(ctx).await
        }
    }
}

/// The core trait for all middleware.
///
/// Implementors receive a [`Context`] and a [`Next`] cursor. They may pass
/// through, short-circuit by returning a [`Response`] without calling `next`,
/// or decorate the downstream response.
///
/// Implementations must be `Send + Sync` because the pipeline is shared across
/// connection tasks, and must return a `Send` future.
pub trait Middleware: Send + Sync {
    /// Handle the request and optionally delegate to the next middleware.
    fn handle(&self, ctx: Context, next: Next) -> Pin<Box<dyn Future<Output = Response> + Send>>;
}

/// An ordered middleware stack terminating in a [`Router`].
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use product_lookup::Router;
/// use product_lookup::middleware::{LoggerMiddleware, Pipeline};
///
/// let pipeline = Pipeline::new(Router::new()).with(Arc::new(LoggerMiddleware));
/// ```
pub struct Pipeline {
    middlewares: Vec<MiddlewareHandler>,
    router: Arc<Router>,
}

impl Pipeline {
    /// Creates a pipeline with no middleware in front of `router`.
    pub fn new(router: Router) -> Self {
        Self {
            middlewares: Vec::new(),
            router: Arc::new(router),
        }
    }

    /// Appends a middleware; the first one added runs outermost.
    #[must_use]
    pub fn with<M>(mut self, middleware: Arc<M>) -> Self
    where
        M: Middleware + 'static,
    {
        self.middlewares.push(from_middleware(middleware));
        self
    }

    /// Freezes the stack so it can be shared by connection tasks.
    pub fn build(self) -> Arc<Stack> {
        Arc::new(Stack {
            middlewares: self.middlewares.into(),
            router: self.router,
        })
    }
}

/// A built, immutable [`Pipeline`].
pub struct Stack {
    middlewares: Arc<[MiddlewareHandler]>,
    router: Arc<Router>,
}

impl Stack {
    /// Runs `ctx` through every middleware and then the router.
    pub async fn dispatch(&self, ctx: Context) -> Response {
        let next = Next {
            middlewares: Arc::clone(&self.middlewares),
            index: 0,
            endpoint: Arc::clone(&self.router),
        };
        next.run(ctx).await
    }

    /// Convenience for callers that hold a bare [`Request`].
    pub async fn handle(&self, request: Request) -> Response {
        self.dispatch(Context::new(request)).await
    }
}

/// Logs each request's method, path, status, and duration.
///
/// Emits one `tracing::info!` event after the downstream handler completes.
/// Never short-circuits.
pub struct LoggerMiddleware;

impl Middleware for LoggerMiddleware {
    fn handle(&self, ctx: Context, next: Next) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        Box::pin(async move {
            let start = Instant::now();
            let method = ctx.request().method().as_str().to_owned();
            let path = ctx.request().path().to_owned();
            let peer = ctx.peer();

            let response = next.run(ctx).await;

            tracing::info!(
                %method,
                %path,
                peer = ?peer,
                status = response.status().as_u16(),
                elapsed = ?start.elapsed(),
                "request served"
            );

            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StatusCode;

    struct Deny;

    impl Middleware for Deny {
        fn handle(
            &self,
            _ctx: Context,
            _next: Next,
        ) -> Pin<Box<dyn Future<Output = Response> + Send>> {
            Box::pin(async { Response::text(StatusCode::BadRequest, "denied") })
        }
    }

    struct Tag;

    impl Middleware for Tag {
        fn handle(&self, ctx: Context, next: Next) -> Pin<Box<dyn Future<Output = Response> + Send>> {
            Box::pin(async move { next.run(ctx).await.header("X-Tag", "1") })
        }
    }

    fn request(path: &str) -> Request {
        let raw = format!("GET {path} HTTP/1.1\r\n\r\n");
        Request::parse(raw.as_bytes(), 4096).unwrap().0
    }

    fn router() -> Router {
        let mut router = Router::new();
        router.get("/hc", |_ctx| async { Response::new(StatusCode::Ok) });
        router
    }

    #[tokio::test]
    async fn empty_pipeline_reaches_router() {
        let stack = Pipeline::new(router()).build();
        assert_eq!(stack.handle(request("/hc")).await.status(), StatusCode::Ok);
        assert_eq!(
            stack.handle(request("/nope")).await.status(),
            StatusCode::NotFound
        );
    }

    #[tokio::test]
    async fn logger_passes_response_through() {
        let stack = Pipeline::new(router())
            .with(Arc::new(LoggerMiddleware))
            .with(Arc::new(Tag))
            .build();
        let res = stack.handle(request("/hc")).await;
        assert_eq!(res.status(), StatusCode::Ok);
        assert_eq!(res.headers().get("x-tag"), Some("1"));
    }

    #[tokio::test]
    async fn middleware_can_short_circuit() {
        let stack = Pipeline::new(router()).with(Arc::new(Deny)).build();
        let res = stack.handle(request("/hc")).await;
        assert_eq!(res.status(), StatusCode::BadRequest);
        assert_eq!(res.payload(), b"denied");
    }
}
