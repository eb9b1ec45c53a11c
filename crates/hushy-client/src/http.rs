//! Shared HTTP client for the backend REST API.
//!
//! Every service goes through [`ApiClient`]: it prefixes paths with the
//! resolved base URL, injects the bearer token once the user is signed in,
//! and turns non-2xx responses into [`ClientError::Api`] carrying the
//! backend's message.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use hushy_shared::api::ApiErrorBody;

use crate::error::{ClientError, Result};

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Arc<str>,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self::with_http(http, base_url))
    }

    pub fn with_http(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&self, token: Option<String>) {
        match self.token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.read().map(|t| t.is_some()).unwrap_or(false)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        let token = self.token.read().ok().and_then(|t| t.clone());
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        decode(self.execute(self.request(Method::GET, path), path).await?).await
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let builder = self.request(Method::GET, path).query(query);
        decode(self.execute(builder, path).await?).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let builder = self.request(Method::POST, path).json(body);
        decode(self.execute(builder, path).await?).await
    }

    /// POST with a per-request timeout overriding the client default.
    pub async fn post_with_timeout<T, B>(
        &self,
        path: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let builder = self.request(Method::POST, path).json(body).timeout(timeout);
        decode(self.execute(builder, path).await?).await
    }

    /// POST whose response body is ignored.
    pub async fn post_no_content<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let builder = self.request(Method::POST, path).json(body);
        self.execute(builder, path).await?;
        Ok(())
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let builder = self.request(Method::PATCH, path).json(body);
        decode(self.execute(builder, path).await?).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute(self.request(Method::DELETE, path), path).await?;
        Ok(())
    }

    pub async fn delete_with_body<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let builder = self.request(Method::DELETE, path).json(body);
        self.execute(builder, path).await?;
        Ok(())
    }

    async fn execute(&self, builder: RequestBuilder, path: &str) -> Result<Response> {
        let resp = builder.send().await?;
        let status = resp.status();
        debug!(path, status = status.as_u16(), "api response");

        if status.is_success() {
            return Ok(resp);
        }

        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .ok()
            .and_then(|body| body.text().map(str::to_string))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });

        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    Ok(resp.json::<T>().await?)
}

/// Pick the backend base URL: the first candidate whose `/api/health`
/// answers 2xx, otherwise the first candidate.
pub async fn resolve_base_url(candidates: &[String], probe_timeout: Duration) -> Result<String> {
    let first = candidates
        .first()
        .ok_or_else(|| ClientError::Config("no API base URL configured".into()))?;

    if candidates.len() == 1 {
        return Ok(first.clone());
    }

    let http = reqwest::Client::builder().timeout(probe_timeout).build()?;

    for candidate in candidates {
        let url = format!("{}/api/health", candidate.trim_end_matches('/'));
        match http.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!(base_url = %candidate, "resolved API base URL");
                return Ok(candidate.clone());
            }
            Ok(resp) => {
                debug!(base_url = %candidate, status = resp.status().as_u16(), "health probe failed")
            }
            Err(e) => debug!(base_url = %candidate, error = %e, "health probe failed"),
        }
    }

    warn!(base_url = %first, "no API candidate answered, falling back to the first one");
    Ok(first.clone())
}
