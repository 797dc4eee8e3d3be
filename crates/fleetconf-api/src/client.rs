// Remote builder HTTP client
//
// One client per discovered builder endpoint. The only operation is
// `POST v1/build`; everything else here is URL normalization and
// response/error decoding.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::Error;
use crate::types::{BuildRequest, BuildResponse, ErrorBody};

const BUILD_PATH: &str = "v1/build";

/// Async client for a single remote mconfig builder.
#[derive(Debug, Clone)]
pub struct BuilderClient {
    http: reqwest::Client,
    base_url: Url,
}

impl BuilderClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client for `base_url` with a request timeout and an optional
    /// bearer token injected on every request.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        auth_token: Option<&SecretString>,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        if let Some(token) = auth_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| Error::InvalidToken {
                    message: e.to_string(),
                })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages headers and timeouts).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Ensure the base path ends with `/` so relative joins append rather
    /// than replace the last segment.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Public API ───────────────────────────────────────────────────

    /// Ask the builder for its contribution to one gateway's mconfig.
    pub async fn build(&self, request: &BuildRequest) -> Result<BuildResponse, Error> {
        let url = self.base_url.join(BUILD_PATH)?;
        debug!(gateway_id = %request.gateway_id, "POST {url}");

        let resp = self.http.post(url).json(request).send().await?;
        self.handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response(&self, resp: reqwest::Response) -> Result<BuildResponse, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::parse_error(status, resp).await);
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();

        let message = match serde_json::from_str::<ErrorBody>(&raw) {
            Ok(ErrorBody { message: Some(m) }) => m,
            _ if raw.is_empty() => status.to_string(),
            _ => raw,
        };

        Error::Builder {
            status: status.as_u16(),
            message,
        }
    }
}
