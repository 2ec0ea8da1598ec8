//! Client for the media backend API, the REST service broadcasters use to
//! deliver their metadata to POMS.
//!
//! Writes are asynchronous on the backend side: a `POST` answers
//! `202 Accepted` with the mid (or crid) of the object and the change
//! becomes visible later. Use [`crate::wait`] to observe it.

use reqwest::{header, Method, StatusCode};
use tracing::info;

use crate::config::{Config, Prefix};
use crate::error::{ApiError, ApiResult};
use crate::http::{self, Reply, Timeouts};
use crate::media::{
    ImageUpdate, LocationUpdate, MediaForm, ProgramUpdate, SegmentUpdate, StreamingStatus,
};
use crate::xml::{self, XmlError};

/// Query parameter naming the address that receives asynchronous errors.
pub const ERRORS: &str = "errors";

const XML: &str = "application/xml";

/// What to do with a crid that already belongs to another object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StealCrids {
    Yes,
    No,
    IfDeleted,
}

impl StealCrids {
    fn as_param(&self) -> &'static str {
        match self {
            StealCrids::Yes => "YES",
            StealCrids::No => "NO",
            StealCrids::IfDeleted => "IF_DELETED",
        }
    }
}

/// On whose behalf updates are made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerType {
    Broadcaster,
    Authority,
}

impl OwnerType {
    fn as_param(&self) -> &'static str {
        match self {
            OwnerType::Broadcaster => "BROADCASTER",
            OwnerType::Authority => "AUTHORITY",
        }
    }
}

/// Per-client request options, sent as query parameters.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub follow_merges: bool,
    pub validate_input: bool,
    pub lookup_crids: bool,
    pub steal_crids: StealCrids,
    pub owner: OwnerType,
    pub errors: Option<String>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            follow_merges: true,
            validate_input: true,
            lookup_crids: true,
            steal_crids: StealCrids::IfDeleted,
            owner: OwnerType::Broadcaster,
            errors: None,
        }
    }
}

pub struct MediaBackendClient {
    client: reqwest::Client,
    base_url: String,
    user: String,
    password: String,
    timeouts: Timeouts,
    pub settings: BackendSettings,
}

impl MediaBackendClient {
    /// Creates a client with default settings.
    ///
    /// # Arguments
    /// * `base_url` - Root of the backend API (e.g. "https://api-test.poms.omroep.nl/")
    pub fn new(
        base_url: &str,
        user: impl Into<String>,
        password: impl Into<String>,
        relaxed_https: bool,
    ) -> ApiResult<Self> {
        let timeouts = Timeouts::default();
        Ok(Self {
            client: http::build_client(&timeouts, relaxed_https)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            user: user.into(),
            password: password.into(),
            timeouts,
            settings: BackendSettings::default(),
        })
    }

    /// Creates a client from the `[npo_backend_api]` section.
    pub fn configured(config: &Config) -> ApiResult<Self> {
        let prefix = Prefix::NpoBackendApi;
        let mut client = Self::new(
            &config.base_url(prefix)?,
            config.required_option(prefix, "user")?,
            config.required_option(prefix, "password")?,
            config.relaxed_https(),
        )?;
        client.settings.errors = config.config_option(prefix, "errors_email");
        Ok(client)
    }

    pub fn with_owner(mut self, owner: OwnerType) -> Self {
        self.settings.owner = owner;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn write_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("validateInput", self.settings.validate_input.to_string()),
            ("lookupcrid", self.settings.lookup_crids.to_string()),
            ("stealcrids", self.settings.steal_crids.as_param().to_string()),
            ("owner", self.settings.owner.as_param().to_string()),
        ];
        if let Some(errors) = &self.settings.errors {
            params.push((ERRORS, errors.clone()));
        }
        params
    }

    fn read_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("followMerges", self.settings.follow_merges.to_string()),
            ("owner", self.settings.owner.as_param().to_string()),
        ]
    }

    /// Sends an authenticated request and returns whatever came back.
    pub async fn raw(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        body: Option<String>,
    ) -> ApiResult<Reply> {
        let url = self.url(path);
        let mut request = self
            .client
            .request(method.clone(), &url)
            .basic_auth(&self.user, Some(&self.password))
            .header(header::ACCEPT, XML)
            .query(params);
        if let Some(body) = body {
            request = request.header(header::CONTENT_TYPE, XML).body(body);
        }
        http::send(request, method, &url, self.timeouts.warn_threshold).await
    }

    /// POST media/media. Returns the mid, or the crid if the update was identified by one.
    pub async fn post_update(&self, xml: String) -> ApiResult<String> {
        let reply = self
            .raw(Method::POST, "media/media", &self.write_params(), Some(xml))
            .await?
            .expect(StatusCode::ACCEPTED)?;
        Ok(reply.body.trim().to_string())
    }

    pub async fn set(&self, update: &ProgramUpdate) -> ApiResult<String> {
        let id = self.post_update(update.to_xml()?).await?;
        info!("Posted program {}", id);
        Ok(id)
    }

    pub async fn set_segment(&self, segment: &SegmentUpdate) -> ApiResult<String> {
        let id = self.post_update(segment.to_xml()?).await?;
        info!("Posted segment {}", id);
        Ok(id)
    }

    /// GET media/media/{id}, `None` if the backend does not know the id.
    pub async fn get(&self, id: &str) -> ApiResult<Option<String>> {
        let path = format!("media/media/{}", urlencoding::encode(id));
        let reply = self.raw(Method::GET, &path, &self.read_params(), None).await?;
        if reply.status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(reply.expect(StatusCode::OK)?.body))
    }

    pub async fn get_program(&self, id: &str) -> ApiResult<Option<ProgramUpdate>> {
        match self.get(id).await? {
            Some(xml) => Ok(Some(ProgramUpdate::from_xml(&xml)?)),
            None => Ok(None),
        }
    }

    /// Rewrites the stored document of `id` with `edit` and posts the result.
    ///
    /// Unlike [`Self::set`] this keeps every element the edit does not touch,
    /// including the ones [`ProgramUpdate`] does not model. Returns the mid,
    /// `None` if the backend does not know `id`.
    pub async fn edit(
        &self,
        id: &str,
        edit: impl FnOnce(&str) -> Result<String, XmlError>,
    ) -> ApiResult<Option<String>> {
        let Some(doc) = self.get(id).await? else {
            return Ok(None);
        };
        let id = self.post_update(edit(&doc)?).await?;
        info!("Edited {}", id);
        Ok(Some(id))
    }

    /// DELETE media/media/{id}. The object is marked deleted asynchronously.
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        let path = format!("media/media/{}", urlencoding::encode(id));
        let mut params = Vec::new();
        if let Some(errors) = &self.settings.errors {
            params.push((ERRORS, errors.clone()));
        }
        self.raw(Method::DELETE, &path, &params, None)
            .await?
            .expect(StatusCode::ACCEPTED)?;
        Ok(())
    }

    /// POST media/find, returning the result list as XML.
    pub async fn find(&self, form: &MediaForm) -> ApiResult<String> {
        let reply = self
            .raw(Method::POST, "media/find", &[], Some(form.to_xml()?))
            .await?
            .expect(StatusCode::OK)?;
        Ok(reply.body)
    }

    pub async fn find_total_count(&self, form: &MediaForm) -> ApiResult<u64> {
        let list = self.find(form).await?;
        let total = xml::root_attribute(&list, "totalCount")?
            .ok_or_else(|| anyhow::anyhow!("No totalCount in find result"))?;
        total
            .parse()
            .map_err(|e| ApiError::from(anyhow::anyhow!("Invalid totalCount {}: {}", total, e)))
    }

    /// POST media/media/{mid}/image.
    pub async fn add_image(&self, mid: &str, image: &ImageUpdate) -> ApiResult<()> {
        let path = format!("media/media/{}/image", urlencoding::encode(mid));
        self.raw(Method::POST, &path, &self.write_params(), Some(image.to_xml()?))
            .await?
            .expect(StatusCode::ACCEPTED)?;
        info!("Added image '{}' to {}", image.title, mid);
        Ok(())
    }

    /// POST media/media/{mid}/location.
    pub async fn add_location(&self, mid: &str, location: &LocationUpdate) -> ApiResult<()> {
        let path = format!("media/media/{}/location", urlencoding::encode(mid));
        self.raw(Method::POST, &path, &self.write_params(), Some(location.to_xml()?))
            .await?
            .expect(StatusCode::ACCEPTED)?;
        info!("Added location {} to {}", location.program_url, mid);
        Ok(())
    }

    pub async fn streaming_status(&self, mid: &str) -> ApiResult<StreamingStatus> {
        let path = format!("media/streamingstatus/{}", urlencoding::encode(mid));
        let reply = self
            .raw(Method::GET, &path, &[], None)
            .await?
            .expect(StatusCode::OK)?;
        Ok(StreamingStatus::from_xml(&reply.body)?)
    }

    /// GET media/version, e.g. `5.12.3-SNAPSHOT`.
    pub async fn version(&self) -> ApiResult<String> {
        let reply = self
            .raw(Method::GET, "media/version", &[], None)
            .await?
            .expect(StatusCode::OK)?;
        Ok(reply.body.trim().to_string())
    }

    /// The numeric parts of [`Self::version`], `[0]` if it cannot be determined.
    pub async fn version_number(&self) -> Vec<u32> {
        match self.version().await {
            Ok(version) => parse_version(&version),
            Err(e) => {
                info!("Could not determine backend version: {}", e);
                vec![0]
            }
        }
    }
}

impl std::fmt::Debug for MediaBackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaBackendClient")
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .field("settings", &self.settings)
            .finish()
    }
}

/// `5.12.3-SNAPSHOT` -> `[5, 12, 3]`, `v5.12` -> `[5, 12]`.
pub fn parse_version(version: &str) -> Vec<u32> {
    let numbers: Vec<u32> = version
        .trim_start_matches(|c: char| !c.is_ascii_digit())
        .split(|c: char| !c.is_ascii_digit())
        .take_while(|part| !part.is_empty())
        .map_while(|part| part.parse().ok())
        .collect();
    if numbers.is_empty() {
        vec![0]
    } else {
        numbers
    }
}
