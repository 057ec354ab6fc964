use std::time::Duration;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use plexus_config::{ProviderRecord, ProviderType};
use plexus_router::RouteDecision;
use plexus_transform::ProviderRequest;
use wreq::header::HeaderMap;
use wreq::RequestBuilder;

use crate::client::UpstreamClientCache;
use crate::error::ProviderError;

/// Performs the actual network call against a resolved route. Retries are
/// Router-level, never internal: this type makes exactly one
/// attempt and returns a classified error on failure.
pub struct ProviderInvoker {
    clients: UpstreamClientCache,
}

impl ProviderInvoker {
    pub fn new() -> Self {
        Self { clients: UpstreamClientCache::new() }
    }

    pub async fn call_unary(
        &self,
        route: &RouteDecision,
        request: &ProviderRequest,
    ) -> Result<serde_json::Value, ProviderError> {
        let response = self.send(route, request).await?;
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(http_error(status, response).await);
        }
        response.json::<serde_json::Value>().await.map_err(|e| ProviderError::Decode(e.to_string()))
    }

    /// Returns a cold byte stream: nothing is read from the socket until the
    /// caller starts polling it. If the initial response headers indicate
    /// failure, that is surfaced as the same classified error a unary call
    /// would produce.
    pub async fn call_stream(
        &self,
        route: &RouteDecision,
        request: &ProviderRequest,
    ) -> Result<impl Stream<Item = Result<Bytes, ProviderError>>, ProviderError> {
        let response = self.send(route, request).await?;
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(http_error(status, response).await);
        }
        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| ProviderError::Transport(e.to_string()))))
    }

    async fn send(
        &self,
        route: &RouteDecision,
        request: &ProviderRequest,
    ) -> Result<wreq::Response, ProviderError> {
        let client = self.clients.get_or_build(None);
        let base_url = route.provider.base_url.clone().unwrap_or_else(|| default_base_url(route.provider.kind));
        let url = format!("{}{}", base_url.trim_end_matches('/'), request.endpoint);

        let builder = apply_auth(client.post(url), &route.provider).json(&request.body);
        builder.send().await.map_err(|e| ProviderError::Transport(e.to_string()))
    }
}

impl Default for ProviderInvoker {
    fn default() -> Self {
        Self::new()
    }
}

fn default_base_url(kind: ProviderType) -> String {
    match kind {
        ProviderType::Openai => "https://api.openai.com".to_owned(),
        ProviderType::Anthropic => "https://api.anthropic.com".to_owned(),
        ProviderType::Openrouter => "https://openrouter.ai/api".to_owned(),
        ProviderType::OpenaiCompatible => String::new(),
    }
}

fn apply_auth(mut builder: RequestBuilder, provider: &ProviderRecord) -> RequestBuilder {
    builder = match provider.kind {
        ProviderType::Anthropic => builder.header("x-api-key", provider.api_key.expose()),
        _ => builder.bearer_auth(provider.api_key.expose()),
    };
    for (key, value) in &provider.headers {
        builder = builder.header(key, value);
    }
    builder
}

async fn http_error(status: u16, response: wreq::Response) -> ProviderError {
    let retry_after = parse_retry_after(response.headers());
    let message = response.text().await.unwrap_or_default();
    ProviderError::Http { status, message, retry_after }
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let raw = headers.get("retry-after")?.to_str().ok()?;
    if let Ok(seconds) = raw.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let when = httpdate::parse_http_date(raw).ok()?;
    let now = std::time::SystemTime::now();
    when.duration_since(now).ok()
}
