use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use super::{push_opt, ApiMediaObject, NpoApiClient, Order};
use crate::error::ApiResult;

/// Which part of the schedule to list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleQuery {
    pub guide_day: Option<NaiveDate>,
    pub properties: Option<String>,
    pub sort: Order,
    pub offset: u64,
    pub max: u32,
}

impl ScheduleQuery {
    pub fn for_day(guide_day: NaiveDate) -> Self {
        Self {
            guide_day: Some(guide_day),
            properties: None,
            sort: Order::Asc,
            offset: 0,
            max: 240,
        }
    }

    pub fn with_properties(mut self, properties: impl Into<String>) -> Self {
        self.properties = Some(properties.into());
        self
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(guide_day) = self.guide_day {
            params.push(("guideDay", guide_day.format("%Y-%m-%d").to_string()));
        }
        push_opt(&mut params, "properties", self.properties.as_deref());
        params.push(("sort", self.sort.as_param().to_string()));
        params.push(("offset", self.offset.to_string()));
        params.push(("max", self.max.to_string()));
        params
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResult {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub max: u32,
    #[serde(default)]
    pub items: Vec<ApiScheduleEvent>,
}

impl ScheduleResult {
    pub fn size(&self) -> usize {
        self.items.len()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiScheduleEvent {
    pub channel: String,
    /// Either the net id or an object carrying it.
    #[serde(default)]
    pub net: Option<Value>,
    /// Epoch millis.
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub guide_day: Option<Value>,
    #[serde(default)]
    pub mid_ref: Option<String>,
    #[serde(rename = "media")]
    pub media_object: ApiMediaObject,
}

impl ApiScheduleEvent {
    pub fn net_id(&self) -> Option<&str> {
        match self.net.as_ref()? {
            Value::String(id) => Some(id),
            Value::Object(net) => net.get("id").and_then(Value::as_str),
            _ => None,
        }
    }
}

impl NpoApiClient {
    pub async fn schedule(&self, query: &ScheduleQuery) -> ApiResult<ScheduleResult> {
        self.get_json("schedule", &query.params()).await
    }

    pub async fn schedule_for_broadcaster(
        &self,
        broadcaster: &str,
        query: &ScheduleQuery,
    ) -> ApiResult<ScheduleResult> {
        let path = format!("schedule/broadcaster/{}", urlencoding::encode(broadcaster));
        self.get_json(&path, &query.params()).await
    }

    pub async fn schedule_for_channel(
        &self,
        channel: &str,
        query: &ScheduleQuery,
    ) -> ApiResult<ScheduleResult> {
        let path = format!("schedule/channel/{}", urlencoding::encode(channel));
        self.get_json(&path, &query.params()).await
    }

    pub async fn schedule_for_net(&self, net: &str, query: &ScheduleQuery) -> ApiResult<ScheduleResult> {
        let path = format!("schedule/net/{}", urlencoding::encode(net));
        self.get_json(&path, &query.params()).await
    }

    /// The broadcast currently on air for `broadcaster`. 404 if there is none.
    pub async fn now_for_broadcaster(&self, broadcaster: &str) -> ApiResult<ApiScheduleEvent> {
        let path = format!("schedule/broadcaster/{}/now", urlencoding::encode(broadcaster));
        self.get_json(&path, &[]).await
    }

    pub async fn next_for_broadcaster(&self, broadcaster: &str) -> ApiResult<ApiScheduleEvent> {
        let path = format!("schedule/broadcaster/{}/next", urlencoding::encode(broadcaster));
        self.get_json(&path, &[]).await
    }

    /// The broadcast currently on air on `channel`. 404 if there is none.
    pub async fn now_for_channel(&self, channel: &str) -> ApiResult<ApiScheduleEvent> {
        let path = format!("schedule/channel/{}/now", urlencoding::encode(channel));
        self.get_json(&path, &[]).await
    }

    pub async fn next_for_channel(&self, channel: &str) -> ApiResult<ApiScheduleEvent> {
        let path = format!("schedule/channel/{}/next", urlencoding::encode(channel));
        self.get_json(&path, &[]).await
    }
}
