use bytes::Bytes;
use cproxy_cache::{CacheEntry, CacheLookup, CacheManager, CachePolicy};
use cproxy_config::ProxyConfig;
use cproxy_origin::{Forwarder, OriginError, OriginResponse};
use http::{Request, Response};
use http_body_util::Full;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument};

use crate::{inflight::InFlight, response::ProxyResponse};

/// HIT / MISS decision for every inbound request.
///
/// Only the URI path keys the cache. Method, headers, query string and body
/// of the inbound request are ignored.
#[derive(Debug)]
pub struct Router<F> {
    cache: CacheManager,
    forwarder: F,
    inflight: Option<InFlight>,
    replay_origin_status: bool,
}

impl<F: Forwarder> Router<F> {
    pub fn new(cfg: &ProxyConfig, forwarder: F) -> Self {
        let inflight = cfg.coalesce_misses.then(InFlight::new);
        Self {
            cache: CacheManager::new(CachePolicy::from_secs(cfg.ttl_secs)),
            forwarder,
            inflight,
            replay_origin_status: cfg.replay_origin_status,
        }
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    pub fn forwarder(&self) -> &F {
        &self.forwarder
    }

    /// hyper entry point.
    #[instrument(skip(self, req), fields(method = %req.method(), path = %req.uri().path()))]
    pub async fn handle<B>(&self, req: Request<B>) -> Response<Full<Bytes>> {
        self.route(req.uri().path()).await.into_response()
    }

    pub async fn route(&self, path: &str) -> ProxyResponse {
        match self.cache.lookup(path, Instant::now()) {
            CacheLookup::Fresh(entry) => {
                info!(
                    target: "cproxy::router",
                    %path,
                    cache = "HIT",
                    status = entry.status.as_u16(),
                    "Serving from cache"
                );
                return ProxyResponse::hit(entry, self.replay_origin_status);
            }
            CacheLookup::Stale(_) => {
                debug!(target: "cproxy::router", %path, "Cached entry stale; refetching");
            }
            CacheLookup::Absent => {
                debug!(target: "cproxy::router", %path, "No cached entry");
            }
        }

        let fetched = match &self.inflight {
            Some(inflight) => inflight.run(path, || self.fetch_and_store(path)).await,
            None => self.fetch_and_store(path).await,
        };

        match fetched {
            Ok(origin) => {
                info!(
                    target: "cproxy::router",
                    %path,
                    cache = "MISS",
                    status = origin.status.as_u16(),
                    "Served from origin"
                );
                ProxyResponse::miss(origin)
            }
            Err(e) => {
                error!(
                    target: "cproxy::router",
                    %path,
                    error = %e,
                    "Origin fetch failed; returning 500"
                );
                ProxyResponse::internal_error()
            }
        }
    }

    /// Store happens only after a successful fetch; failures leave the
    /// previous entry (stale or not) untouched.
    async fn fetch_and_store(&self, path: &str) -> Result<OriginResponse, OriginError> {
        let origin = self.forwarder.fetch(path).await?;
        let entry = CacheEntry::new(
            origin.status,
            origin.content_type.clone(),
            origin.body.clone(),
            Instant::now(),
        );
        self.cache.store(path, entry);
        Ok(origin)
    }
}
