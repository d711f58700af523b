//! HTTP capability backed by reqwest.

use crate::traits::{CapabilityResult, FetchInit, HttpCapability};
use anyhow::Context;
use async_trait::async_trait;
use reagent_core::Value;
use reqwest::Method;

/// Outbound HTTP client.
///
/// Responses are decoded as JSON when possible and fall back to the raw body
/// text, so programs can consume both API and plain-text endpoints.
#[derive(Clone, Default)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl HttpCapability for HttpClient {
    async fn fetch(&self, url: &str, init: FetchInit) -> CapabilityResult<Value> {
        let method = Method::from_bytes(init.method.as_bytes())
            .with_context(|| format!("invalid HTTP method '{}'", init.method))?;

        tracing::debug!(url = %url, method = %method, "dispatching HTTP request");

        let mut request = self.client.request(method, url);
        for (name, value) in &init.headers {
            request = request.header(name, value);
        }
        if let Some(body) = &init.body {
            request = request.json(&body.to_json()?);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("request to '{url}' failed"))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| format!("reading response body from '{url}' failed"))?;

        if !status.is_success() {
            anyhow::bail!("'{url}' returned {status}: {text}");
        }

        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(json) => Ok(Value::from_json(&json)),
            Err(_) => Ok(Value::String(text)),
        }
    }
}
