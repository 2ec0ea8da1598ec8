use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::{push_opt, NpoApiClient, Order};
use crate::error::ApiResult;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Broadcaster {
    pub id: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// The parts of a published media object the tests look at.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMediaObject {
    pub mid: String,
    #[serde(default)]
    pub object_type: Option<String>,
    #[serde(default, rename = "type")]
    pub media_type: Option<String>,
    #[serde(default)]
    pub broadcasters: Vec<Broadcaster>,
    #[serde(default)]
    pub titles: Vec<Value>,
}

impl ApiMediaObject {
    pub fn has_broadcaster(&self, id: &str) -> bool {
        self.broadcasters.iter().any(|broadcaster| broadcaster.id == id)
    }

    pub fn main_title(&self) -> Option<&str> {
        self.titles
            .iter()
            .find(|title| title.get("type").and_then(Value::as_str) == Some("MAIN"))
            .and_then(|title| title.get("value"))
            .and_then(Value::as_str)
    }
}

/// A page of media objects, e.g. the members of a group.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaResult {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub max: u32,
    #[serde(default)]
    pub items: Vec<ApiMediaObject>,
}

impl MediaResult {
    pub fn size(&self) -> usize {
        self.items.len()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResultItem {
    pub result: ApiMediaObject,
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TermFacetResultItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MultipleFacetsResult {
    pub name: String,
    #[serde(default)]
    pub facets: Vec<TermFacetResultItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFacetsResult {
    #[serde(default)]
    pub age_ratings: Option<Vec<TermFacetResultItem>>,
    #[serde(default)]
    pub relations: Option<Vec<MultipleFacetsResult>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaSearchResult {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub max: u32,
    #[serde(default)]
    pub items: Vec<SearchResultItem>,
    #[serde(default)]
    pub facets: Option<MediaFacetsResult>,
}

impl MediaSearchResult {
    pub fn size(&self) -> usize {
        self.items.len()
    }
}

/// Where a changes feed starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Since {
    /// Publications after this moment.
    Instant(DateTime<Utc>),
    /// Changes after this sequence number of the legacy couchdb feed.
    Sequence(u64),
}

/// An entry of the changes feed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub sequence: Option<u64>,
    #[serde(default)]
    pub revision: Option<i64>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub publish_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted: bool,
    /// Marks the end of the available changes rather than a change.
    #[serde(default)]
    pub tail: bool,
}

#[derive(Debug, Deserialize)]
struct ChangesResult {
    #[serde(default)]
    changes: Vec<Change>,
}

fn search_params(profile: Option<&str>, offset: u64, max: u32) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    push_opt(&mut params, "profile", profile);
    params.push(("offset", offset.to_string()));
    params.push(("max", max.to_string()));
    params
}

impl NpoApiClient {
    /// GET api/media/{mid}. 404 for unknown mids.
    pub async fn load(&self, mid: &str) -> ApiResult<ApiMediaObject> {
        self.get_json(&format!("media/{}", urlencoding::encode(mid)), &[])
            .await
    }

    /// Lists the members of the group `mid`.
    pub async fn members(&self, mid: &str, order: Order, offset: u64, max: u32) -> ApiResult<MediaResult> {
        let params = vec![
            ("order", order.as_param().to_string()),
            ("offset", offset.to_string()),
            ("max", max.to_string()),
        ];
        self.get_json(&format!("media/{}/members", urlencoding::encode(mid)), &params)
            .await
    }

    /// Searches all media with a JSON media form.
    pub async fn find(
        &self,
        form: &Value,
        profile: Option<&str>,
        offset: u64,
        max: u32,
    ) -> ApiResult<MediaSearchResult> {
        self.post_json("media", &search_params(profile, offset, max), form)
            .await
    }

    /// Searches the members of the group `mid`.
    pub async fn find_members(
        &self,
        form: &Value,
        mid: &str,
        profile: Option<&str>,
        offset: u64,
        max: u32,
    ) -> ApiResult<MediaSearchResult> {
        self.post_json(
            &format!("media/{}/members", urlencoding::encode(mid)),
            &search_params(profile, offset, max),
            form,
        )
        .await
    }

    /// Searches the episodes of the series `mid`.
    pub async fn find_episodes(
        &self,
        form: &Value,
        mid: &str,
        profile: Option<&str>,
        offset: u64,
        max: u32,
    ) -> ApiResult<MediaSearchResult> {
        self.post_json(
            &format!("media/{}/episodes", urlencoding::encode(mid)),
            &search_params(profile, offset, max),
            form,
        )
        .await
    }

    /// The changes feed, tail markers included. 404 for unknown profiles.
    pub async fn changes(
        &self,
        profile: Option<&str>,
        since: Since,
        order: Order,
        max: u32,
    ) -> ApiResult<Vec<Change>> {
        let mut params = Vec::new();
        push_opt(&mut params, "profile", profile);
        match since {
            Since::Instant(instant) => params.push((
                "publishedSince",
                instant.to_rfc3339_opts(SecondsFormat::Millis, true),
            )),
            Since::Sequence(sequence) => params.push(("since", sequence.to_string())),
        }
        params.push(("order", order.as_param().to_string()));
        params.push(("max", max.to_string()));
        let result: ChangesResult = self.get_json("media/changes", &params).await?;
        Ok(result.changes)
    }
}
