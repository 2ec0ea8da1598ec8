use chrono::{DateTime, Utc};
use serde::Serialize;

use super::SEARCH_NAMESPACE;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaPager {
    pub offset: u64,
    pub max: u32,
}

impl Default for MediaPager {
    fn default() -> Self {
        Self { offset: 0, max: 50 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleForm {
    #[serde(rename = "@tokenized")]
    pub tokenized: bool,
    #[serde(rename = "$text")]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstantRange {
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
}

/// Search form for `media/find` on the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename = "mediaForm")]
pub struct MediaForm {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    pub pager: MediaPager,
    #[serde(rename = "broadcaster", skip_serializing_if = "Vec::is_empty")]
    pub broadcasters: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "title", skip_serializing_if = "Vec::is_empty")]
    pub titles: Vec<TitleForm>,
    #[serde(rename = "creationRange", skip_serializing_if = "Option::is_none")]
    pub creation_range: Option<InstantRange>,
}

impl Default for MediaForm {
    fn default() -> Self {
        Self {
            xmlns: SEARCH_NAMESPACE,
            pager: MediaPager::default(),
            broadcasters: Vec::new(),
            text: None,
            titles: Vec::new(),
            creation_range: None,
        }
    }
}

impl MediaForm {
    pub fn with_max(mut self, max: u32) -> Self {
        self.pager.max = max;
        self
    }

    pub fn with_broadcaster(mut self, broadcaster: &str) -> Self {
        self.broadcasters.push(broadcaster.to_string());
        self
    }

    /// Matches the exact title, not its tokens.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.titles.push(TitleForm {
            tokenized: false,
            value: title.into(),
        });
        self
    }

    pub fn with_creation_range(mut self, start: DateTime<Utc>, stop: DateTime<Utc>) -> Self {
        self.creation_range = Some(InstantRange { start, stop });
        self
    }

    pub fn to_xml(&self) -> Result<String, quick_xml::SeError> {
        quick_xml::se::to_string(self)
    }
}
