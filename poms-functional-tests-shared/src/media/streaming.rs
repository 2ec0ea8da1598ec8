use serde::Deserialize;

/// Answer of `media/streamingstatus/{mid}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename = "streamingStatus")]
pub struct StreamingStatus {
    #[serde(rename = "@withDrm", default)]
    pub with_drm: Option<String>,
    #[serde(rename = "@withoutDrm", default)]
    pub without_drm: Option<String>,
    #[serde(rename = "@audioWithoutDrm", default)]
    pub audio_without_drm: Option<String>,
}

impl StreamingStatus {
    pub fn from_xml(xml: &str) -> Result<Self, quick_xml::DeError> {
        quick_xml::de::from_str(xml)
    }

    /// Whether any of the streams is online.
    pub fn is_online(&self) -> bool {
        [&self.with_drm, &self.without_drm, &self.audio_without_drm]
            .iter()
            .any(|value| value.as_deref() == Some("ONLINE"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_streaming_status() {
        let status = StreamingStatus::from_xml(
            r#"<streamingStatus xmlns="urn:vpro:media:2009" withDrm="ONLINE" withoutDrm="OFFLINE"/>"#,
        )
        .unwrap();

        assert_eq!(status.with_drm.as_deref(), Some("ONLINE"));
        assert_eq!(status.without_drm.as_deref(), Some("OFFLINE"));
        assert_eq!(status.audio_without_drm, None);
        assert!(status.is_online());
    }
}
