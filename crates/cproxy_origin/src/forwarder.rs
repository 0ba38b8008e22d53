use std::future::Future;

use bytes::Bytes;
use cproxy_config::ProxyConfig;
use http::{header::CONTENT_TYPE, HeaderValue, Request, StatusCode, Uri};
use http_body_util::{BodyExt, Empty};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::time::{timeout, Duration};
use tracing::{debug, instrument, warn};

use crate::error::OriginError;

/// Fully buffered origin answer.
#[derive(Debug, Clone)]
pub struct OriginResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

/// Fetches a path from the origin. One attempt, no retries.
pub trait Forwarder: Send + Sync + 'static {
    fn fetch(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<OriginResponse, OriginError>> + Send;
}

/// Forwarder backed by hyper's pooled HTTP/1 client.
///
/// Only the path travels upstream: query strings and client headers are
/// dropped.
#[derive(Debug, Clone)]
pub struct OriginForwarder {
    origin: String,
    timeout: Option<Duration>,
    client: Client<HttpConnector, Empty<Bytes>>,
}

impl OriginForwarder {
    pub fn new(origin: impl Into<String>, timeout: Option<Duration>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build_http();
        Self {
            origin: origin.into(),
            timeout,
            client,
        }
    }

    pub fn from_config(cfg: &ProxyConfig) -> Self {
        let timeout = match cfg.origin_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Self::new(cfg.origin.clone(), timeout)
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// `origin + path`, no normalization.
    pub fn target_uri(&self, path: &str) -> Result<Uri, OriginError> {
        let raw = format!("{}{}", self.origin, path);
        raw.parse::<Uri>()
            .map_err(|e| OriginError::unavailable(format!("invalid origin URL '{raw}': {e}")))
    }

    async fn fetch_uri(&self, uri: Uri) -> Result<OriginResponse, OriginError> {
        let req = Request::get(uri)
            .body(Empty::<Bytes>::new())
            .map_err(|e| OriginError::unavailable(e.to_string()))?;

        let resp = self
            .client
            .request(req)
            .await
            .map_err(|e| OriginError::unavailable(e.to_string()))?;

        let (parts, body) = resp.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| OriginError::unavailable(format!("failed reading origin body: {e}")))?
            .to_bytes();

        Ok(OriginResponse {
            status: parts.status,
            content_type: parts.headers.get(CONTENT_TYPE).cloned(),
            body,
        })
    }
}

impl Forwarder for OriginForwarder {
    #[instrument(skip(self), fields(origin = %self.origin))]
    async fn fetch(&self, path: &str) -> Result<OriginResponse, OriginError> {
        let uri = self.target_uri(path)?;
        debug!(target: "cproxy::origin", %uri, "Fetching from origin");

        let result = match self.timeout {
            Some(limit) => match timeout(limit, self.fetch_uri(uri)).await {
                Ok(res) => res,
                Err(_) => Err(OriginError::unavailable(format!(
                    "timed out after {}s",
                    limit.as_secs_f64()
                ))),
            },
            None => self.fetch_uri(uri).await,
        };

        match &result {
            Ok(resp) => debug!(
                target: "cproxy::origin",
                status = resp.status.as_u16(),
                body_len = resp.body.len(),
                "Origin responded"
            ),
            Err(e) => warn!(target: "cproxy::origin", error = %e, "Origin fetch failed"),
        }

        result
    }
}
