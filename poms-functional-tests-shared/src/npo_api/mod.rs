//! Client for the public NPO frontend API (`rs.poms.omroep.nl/v1`).

pub mod auth;
mod media;
mod schedule;

pub use auth::ApiKey;
pub use media::{
    ApiMediaObject, Broadcaster, Change, MediaFacetsResult, MediaResult, MediaSearchResult,
    MultipleFacetsResult, SearchResultItem, Since, TermFacetResultItem,
};
pub use schedule::{ApiScheduleEvent, ScheduleQuery, ScheduleResult};

use chrono::Utc;
use reqwest::{header, Method, Url};
use serde::de::DeserializeOwned;
use std::fmt;

use crate::config::{Config, Prefix};
use crate::error::{ApiError, ApiResult};
use crate::http::{self, Reply, Timeouts};

/// Sort order of listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub fn as_param(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

pub struct NpoApiClient {
    client: reqwest::Client,
    base_url: Url,
    key: ApiKey,
    timeouts: Timeouts,
}

impl NpoApiClient {
    /// # Arguments
    /// * `base_url` - Root of the API including the version, e.g. "https://rs-test.poms.omroep.nl/v1/"
    pub fn new(base_url: &str, key: ApiKey, relaxed_https: bool) -> ApiResult<Self> {
        let timeouts = Timeouts::default();
        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&base_url)
            .map_err(|e| ApiError::Config(anyhow::anyhow!("Invalid base url {}: {}", base_url, e)))?;
        Ok(Self {
            client: http::build_client(&timeouts, relaxed_https)?,
            base_url,
            key,
            timeouts,
        })
    }

    /// Creates a client from the `[npo_api]` section (`api_key`, `secret`, `origin`).
    pub fn configured(config: &Config) -> ApiResult<Self> {
        let key = ApiKey::new(
            config.required_option(Prefix::NpoApi, "api_key")?,
            config.required_option(Prefix::NpoApi, "secret")?,
            config.required_option(Prefix::NpoApi, "origin")?,
        );
        Self::new(&config.base_url(Prefix::NpoApi)?, key, config.relaxed_https())
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn api_url(&self, path: &str) -> ApiResult<Url> {
        self.base_url
            .join(&format!("api/{}", path))
            .map_err(|e| ApiError::Config(anyhow::anyhow!("Invalid path {}: {}", path, e)))
    }

    /// Sends a signed request and returns whatever came back.
    pub async fn raw(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> ApiResult<Reply> {
        let url = self.api_url(path)?;
        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header(header::ACCEPT, "application/json")
            .query(params);
        for (name, value) in self.key.headers(url.path(), params, Utc::now())? {
            request = request.header(name, value);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        http::send(request, method, url.as_str(), self.timeouts.warn_threshold).await
    }

    /// GET, expecting 200 and a JSON body of type `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> ApiResult<T> {
        let reply = self.raw(Method::GET, path, params, None).await?.expect_success()?;
        Ok(serde_json::from_str(&reply.body)?)
    }

    /// POST `body` as JSON, expecting 200 and a JSON body of type `T`.
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        body: &serde_json::Value,
    ) -> ApiResult<T> {
        let reply = self
            .raw(Method::POST, path, params, Some(body))
            .await?
            .expect_success()?;
        Ok(serde_json::from_str(&reply.body)?)
    }
}

impl fmt::Debug for NpoApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NpoApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("key", &self.key)
            .finish()
    }
}

/// Appends `(name, value)` when there is a value.
fn push_opt(params: &mut Vec<(&'static str, String)>, name: &'static str, value: Option<&str>) {
    if let Some(value) = value {
        params.push((name, value.to_string()));
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) fn client(server: &MockServer) -> NpoApiClient {
        NpoApiClient::new(
            &format!("{}/v1", server.uri()),
            ApiKey::new("key", "secret", "https://www.vpro.nl"),
            false,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_requests_are_signed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/api/media/WO_VPRO_025057"))
            .and(header_exists("authorization"))
            .and(header_exists("x-npo-date"))
            .and(header_exists("origin"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"mid":"WO_VPRO_025057"}"#))
            .mount(&server)
            .await;

        let value: serde_json::Value = client(&server)
            .get_json("media/WO_VPRO_025057", &[])
            .await
            .unwrap();

        assert_eq!(value["mid"], "WO_VPRO_025057");
    }

    #[tokio::test]
    async fn test_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/api/media/changes"))
            .and(query_param("profile", "bestaatniet"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client(&server)
            .get_json::<serde_json::Value>("media/changes", &[("profile", "bestaatniet".to_string())])
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[test]
    fn test_configured_requires_key() {
        let config = Config::from_file_config(None, Vec::<(String, String)>::new()).unwrap();
        let err = NpoApiClient::configured(&config).unwrap_err();
        assert!(err.to_string().contains("POMS_NPO_API_API_KEY"));
    }
}
