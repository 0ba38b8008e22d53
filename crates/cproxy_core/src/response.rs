use bytes::Bytes;
use cproxy_cache::CacheEntry;
use cproxy_origin::OriginResponse;
use http::{
    header::{CONTENT_TYPE, HeaderName},
    HeaderValue, Response, StatusCode,
};
use http_body_util::Full;

/// Cache outcome header. Absent on internal errors.
pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

const INTERNAL_ERROR_BODY: &[u8] = b"Internal Server Error\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// What the router decided to send back, before it becomes a hyper response.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
    pub cache_status: Option<CacheStatus>,
}

impl ProxyResponse {
    pub(crate) fn hit(entry: CacheEntry, replay_origin_status: bool) -> Self {
        let status = if replay_origin_status {
            entry.status
        } else {
            StatusCode::OK
        };
        Self {
            status,
            content_type: entry.content_type,
            body: entry.body,
            cache_status: Some(CacheStatus::Hit),
        }
    }

    pub(crate) fn miss(origin: OriginResponse) -> Self {
        Self {
            status: origin.status,
            content_type: origin.content_type,
            body: origin.body,
            cache_status: Some(CacheStatus::Miss),
        }
    }

    pub(crate) fn internal_error() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            content_type: Some(HeaderValue::from_static("text/plain; charset=utf-8")),
            body: Bytes::from_static(INTERNAL_ERROR_BODY),
            cache_status: None,
        }
    }

    pub fn into_response(self) -> Response<Full<Bytes>> {
        let mut resp = Response::new(Full::new(self.body));
        *resp.status_mut() = self.status;

        let headers = resp.headers_mut();
        if let Some(cache_status) = self.cache_status {
            headers.insert(X_CACHE, HeaderValue::from_static(cache_status.as_str()));
        }
        if let Some(content_type) = self.content_type {
            headers.insert(CONTENT_TYPE, content_type);
        }
        resp
    }
}
