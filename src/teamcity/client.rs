//! HTTP client for the TeamCity REST API.

use std::future::Future;
use std::time::Instant;

use reqwest::{header, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::error::{ClientError, ClientResult};
use crate::config::{TeamCitySettings, UpstreamAuth};
use crate::server::metrics::record_upstream_request;

const REST_PREFIX: &str = "/app/rest";

/// The only component that talks to TeamCity. Cheap to share behind an `Arc`;
/// the inner reqwest client pools connections.
pub struct TeamCityClient {
    http: reqwest::Client,
    base_url: String,
    auth: UpstreamAuth,
}

impl TeamCityClient {
    pub fn new(settings: &TeamCitySettings) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;

        // Ensure base_url doesn't have trailing slash
        let base_url = settings.url.trim_end_matches('/').to_string();

        Ok(Self {
            http,
            base_url,
            auth: settings.auth.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            UpstreamAuth::Bearer(token) => request.bearer_auth(token),
            UpstreamAuth::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
        }
    }

    /// Authenticated call against `{base}/app/rest{endpoint}`. Any status
    /// >= 400 becomes [`ClientError::Upstream`] with the response body.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> ClientResult<String> {
        let url = format!("{}{}{}", self.base_url, REST_PREFIX, endpoint);
        debug!("TeamCity {} {}", method, url);

        let mut request = self
            .authorize(self.http.request(method, &url))
            .header(header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request
                .header(header::CONTENT_TYPE, "application/json")
                .body(serde_json::to_vec(body)?);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if status.as_u16() >= 400 {
            return Err(ClientError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        what: &'static str,
    ) -> ClientResult<T> {
        let body = self.request(Method::GET, endpoint, None).await?;
        parse_body(&body, what)
    }

    /// Raw bytes from a non-REST path such as `/downloadBuildLog.html?...`.
    pub async fn download(&self, path_and_query: &str) -> ClientResult<Vec<u8>> {
        let url = format!("{}{}", self.base_url, path_and_query);
        debug!("TeamCity GET {}", url);

        let response = self.authorize(self.http.get(&url)).send().await?;
        let status = response.status();
        if status.as_u16() >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Upstream {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Times a public operation and records it under `operation` with its
    /// real outcome.
    pub(crate) async fn timed<T, F>(&self, operation: &'static str, fut: F) -> ClientResult<T>
    where
        F: Future<Output = ClientResult<T>>,
    {
        let start = Instant::now();
        let result = fut.await;
        record_upstream_request(operation, result.is_ok(), start.elapsed());
        if let Err(e) = &result {
            debug!("TeamCity operation {} failed: {}", operation, e);
        }
        result
    }
}

pub(crate) fn parse_body<T: DeserializeOwned>(body: &str, what: &'static str) -> ClientResult<T> {
    serde_json::from_str(body).map_err(|source| ClientError::ParseResponse { what, source })
}

/// Decode tool arguments, treating an absent or `null` payload as `{}`.
pub fn parse_args<T: DeserializeOwned>(args: Value) -> ClientResult<T> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    Ok(serde_json::from_value(args)?)
}

/// Parse a numeric build id, rejecting anything else before any network call.
pub fn parse_build_id(raw: Option<&str>) -> ClientResult<i64> {
    let raw = raw
        .filter(|id| !id.is_empty())
        .ok_or(ClientError::MissingArgument("buildId"))?;
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ClientError::InvalidBuildId(raw.to_string()))
}
