//! The lookup handler: read-through cache, catalog fallback, write-through.
//!
//! ```text
//! item_id ──► cache.get ──hit──► 200 cached bytes
//!                │ miss / error
//!                ▼
//!           catalog lookup ──► Record ──► JSON ──► cache.put ──► 200 JSON
//! ```
//!
//! Nothing is shared between requests except the read-only service itself.
//! Two concurrent requests for the same id may both miss and both call the
//! catalog; the last cache write wins.

use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::CacheMode;
use crate::context::Context;
use crate::error::LookupError;
use crate::record::Record;
use crate::router::Router;
use crate::upstream::{ItemLookup, LookupRequest};
use crate::{Response, StatusCode};

/// Form field carrying the identifier.
pub const ITEM_ID_PARAM: &str = "item_id";

/// Serves item lookups against one catalog and one cache backend.
pub struct LookupService {
    catalog: Arc<dyn ItemLookup>,
    cache: CacheMode,
}

impl LookupService {
    pub fn new(catalog: Arc<dyn ItemLookup>, cache: CacheMode) -> Self {
        Self { catalog, cache }
    }

    /// The routes of the service: `GET|POST /` for lookups and `GET /hc`.
    pub fn router(self: Arc<Self>) -> Router {
        let mut router = Router::new();

        let service = Arc::clone(&self);
        router.get("/", move |ctx| {
            let service = Arc::clone(&service);
            async move { service.handle(ctx).await }
        });

        let service = self;
        router.post("/", move |ctx| {
            let service = Arc::clone(&service);
            async move { service.handle(ctx).await }
        });

        router.get("/hc", health);
        router
    }

    /// Handles one lookup request end to end.
    pub async fn handle(&self, ctx: Context) -> Response {
        match self.lookup(&ctx).await {
            Ok(response) => response,
            Err(e) => {
                if e.status() == StatusCode::InternalServerError {
                    warn!(error = %e, "lookup failed");
                }
                e.into_response()
            }
        }
    }

    async fn lookup(&self, ctx: &Context) -> Result<Response, LookupError> {
        let form = ctx.form()?;
        let item_id = form.value(ITEM_ID_PARAM).unwrap_or_default();
        if item_id.is_empty() {
            return Err(LookupError::MissingItemId(item_id.to_owned()));
        }

        match self.cache.get(item_id).await {
            Ok(Some(cached)) => {
                info!(item_id, backend = self.cache.name(), "hit cache");
                return Ok(Response::json(cached));
            }
            Ok(None) => {}
            Err(e) => {
                warn!(item_id, backend = self.cache.name(), error = %e, "failed to read cache");
            }
        }

        let response = self
            .catalog
            .item_lookup(&LookupRequest::by_asin(item_id))
            .await?;
        let record = Record::from_response(&response)?;
        let json = record.to_json()?;

        if let Err(e) = self.cache.put(item_id, &json).await {
            warn!(item_id, backend = self.cache.name(), error = %e, "failed to save cache");
        }

        Ok(Response::json(json))
    }
}

/// Liveness probe: always `200` with an empty body.
pub async fn health(_ctx: Context) -> Response {
    Response::new(StatusCode::Ok)
}
