//! Executing `HttpRequest`s: over the network, or through the response cache.

use crate::cache::ResponseCache;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Performs the round-trip between `ErgastClient::build` and a parse method.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by a ureq agent.
///
/// Status codes are returned as data rather than `Err`, letting the client
/// handle status interpretation.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        tracing::debug!(url = %request.path, "GET");
        let mut builder = match request.method {
            HttpMethod::Get => self.agent.get(&request.path),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let mut response = builder.call()?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
            .collect();
        let body = response.body_mut().read_to_string()?;

        Ok(HttpResponse { status, headers, body })
    }
}

/// Serves fresh cached responses and stores successful live ones.
#[derive(Debug)]
pub struct CachedTransport<T> {
    inner: T,
    cache: ResponseCache,
}

impl<T: Transport> CachedTransport<T> {
    pub fn new(inner: T, cache: ResponseCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: Transport> Transport for CachedTransport<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        if let Some(response) = self.cache.get(&request.path) {
            tracing::debug!(url = %request.path, "cache hit");
            return Ok(response);
        }
        tracing::debug!(url = %request.path, "cache miss");

        let response = self.inner.execute(request)?;
        if response.is_success() {
            self.cache.put(&request.path, &response);
        }
        Ok(response)
    }
}
