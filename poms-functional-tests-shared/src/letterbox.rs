//! The "letterbox": import endpoints on the POMS GUI host.
//!
//! `GET import/` lists the available endpoints, one per line with the
//! endpoint url in the first tab-separated column. Each endpoint accepts an
//! XML document with basic authentication and hands it to the import route
//! behind it (NEP notifications, Project M restrictions, ...).

use chrono::NaiveDateTime;
use reqwest::{header, Method, StatusCode};
use serde::Serialize;
use tracing::info;

use crate::config::{Config, Prefix};
use crate::error::ApiResult;
use crate::http::{self, Reply, Timeouts};
use crate::media::NOTIFY_NAMESPACE;

pub const DEFAULT_USER: &str = "vpro-cms";

/// Suffix of the endpoint accepting NEP notifications.
pub const NEP: &str = "/import/nep";

/// Suffix of the endpoint accepting Project M restrictions.
pub const PROJECTM_RESTRICTION: &str = "/import/projectmauthority.restriction";

pub struct LetterBoxClient {
    client: reqwest::Client,
    import_url: String,
    user: String,
    password: String,
    timeouts: Timeouts,
}

impl LetterBoxClient {
    /// # Arguments
    /// * `import_url` - The import root, e.g. "https://poms-test.omroep.nl/import/"
    pub fn new(
        import_url: &str,
        user: impl Into<String>,
        password: impl Into<String>,
        relaxed_https: bool,
    ) -> ApiResult<Self> {
        let timeouts = Timeouts::default();
        Ok(Self {
            client: http::build_client(&timeouts, relaxed_https)?,
            import_url: import_url.to_string(),
            user: user.into(),
            password: password.into(),
            timeouts,
        })
    }

    /// Creates a client from the `[poms]` section (`letterbox-user`, `letterbox-password`).
    pub fn configured(config: &Config) -> ApiResult<Self> {
        let user = config
            .config_option(Prefix::Poms, "letterbox-user")
            .unwrap_or_else(|| DEFAULT_USER.to_string());
        Self::new(
            &config.url(Prefix::Poms, "import/")?,
            user,
            config.required_option(Prefix::Poms, "letterbox-password")?,
            config.relaxed_https(),
        )
    }

    pub fn import_url(&self) -> &str {
        &self.import_url
    }

    /// The endpoint url for `name` when the listing is not consulted.
    pub fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.import_url.trim_end_matches('/'), name)
    }

    pub async fn list_endpoints(&self) -> ApiResult<Vec<String>> {
        let request = self
            .client
            .get(&self.import_url)
            .basic_auth(&self.user, Some(&self.password));
        let reply = http::send(request, Method::GET, &self.import_url, self.timeouts.warn_threshold)
            .await?
            .expect(StatusCode::OK)?;
        let endpoints = parse_endpoints(&reply.body);
        for endpoint in &endpoints {
            info!("{}", endpoint);
        }
        Ok(endpoints)
    }

    /// Posts `body` with the configured credentials.
    pub async fn post_xml(&self, endpoint: &str, body: String) -> ApiResult<Reply> {
        self.post_xml_as(endpoint, body, &self.user, &self.password)
            .await
    }

    /// Posts `body` with explicit credentials, for checking that bad ones are refused.
    pub async fn post_xml_as(
        &self,
        endpoint: &str,
        body: String,
        user: &str,
        password: &str,
    ) -> ApiResult<Reply> {
        let request = self
            .client
            .post(endpoint)
            .basic_auth(user, Some(password))
            .header(header::CONTENT_TYPE, "application/xml")
            .body(body);
        http::send(request, Method::POST, endpoint, self.timeouts.warn_threshold).await
    }

    pub fn user(&self) -> &str {
        &self.user
    }
}

/// The endpoint urls of an import listing.
pub fn parse_endpoints(listing: &str) -> Vec<String> {
    listing
        .lines()
        .filter_map(|line| line.split('\t').next())
        .map(str::trim)
        .filter(|endpoint| !endpoint.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn find_endpoint<'a>(endpoints: &'a [String], suffix: &str) -> Option<&'a str> {
    endpoints
        .iter()
        .find(|endpoint| endpoint.ends_with(suffix))
        .map(String::as_str)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotifyType {
    Online,
    Offline,
    Revoked,
}

/// Notification from NEP that the stream of a mid changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename = "notify")]
pub struct NotifyMessage {
    #[serde(rename = "@drm")]
    pub drm: bool,
    #[serde(rename = "@type")]
    pub notify_type: NotifyType,
    #[serde(rename = "@mid")]
    pub mid: String,
    #[serde(rename = "@timestamp")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
}

impl NotifyMessage {
    pub fn new(notify_type: NotifyType, mid: impl Into<String>, drm: bool, timestamp: NaiveDateTime) -> Self {
        Self {
            drm,
            notify_type,
            mid: mid.into(),
            timestamp,
            xmlns: NOTIFY_NAMESPACE,
        }
    }

    pub fn to_xml(&self) -> Result<String, quick_xml::SeError> {
        quick_xml::se::to_string(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Encryption {
    #[serde(rename = "encryptielabel")]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeRestriction {
    #[serde(rename = "starttijd")]
    pub start: NaiveDateTime,
    #[serde(rename = "eindtijd")]
    pub stop: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Broadcasters {
    #[serde(rename = "omroep")]
    pub broadcaster: Vec<String>,
}

/// A Project M platform restriction for a program.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename = "restriction")]
pub struct Restriction {
    #[serde(rename = "@timestamp")]
    pub timestamp: NaiveDateTime,
    pub prid: String,
    #[serde(rename = "pridexport")]
    pub prid_export: String,
    #[serde(rename = "titel")]
    pub title: String,
    pub platform: String,
    #[serde(rename = "encryptie")]
    pub encryption: Encryption,
    #[serde(rename = "tijdsbeperking")]
    pub time_restriction: TimeRestriction,
    #[serde(rename = "omroepen")]
    pub broadcasters: Broadcasters,
}

impl Restriction {
    pub fn to_xml(&self) -> Result<String, quick_xml::SeError> {
        Ok(format!(
            r#"<?xml version="1.0" encoding="utf-8"?>{}"#,
            quick_xml::se::to_string(self)?
        ))
    }
}
