use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{
    iso_duration, AgeRating, AvFileFormat, AvType, ImageType, License, ProgramType, SegmentType,
    TitleType, UPDATE_NAMESPACE,
};

fn update_namespace() -> String {
    UPDATE_NAMESPACE.to_string()
}

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
    #[serde(rename = "@type")]
    pub title_type: TitleType,
    #[serde(rename = "$text")]
    pub value: String,
}

impl Title {
    pub fn main(value: impl Into<String>) -> Self {
        Self {
            title_type: TitleType::Main,
            value: value.into(),
        }
    }
}

/// A program as posted to and read from `media/media`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "program")]
pub struct ProgramUpdate {
    #[serde(rename = "@xmlns", default = "update_namespace")]
    pub xmlns: String,
    #[serde(rename = "@type")]
    pub program_type: ProgramType,
    #[serde(rename = "@avType")]
    pub av_type: AvType,
    #[serde(rename = "@mid", default, skip_serializing_if = "Option::is_none")]
    pub mid: Option<String>,
    #[serde(rename = "@deleted", default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    #[serde(rename = "@embeddable", default = "yes")]
    pub embeddable: bool,
    #[serde(rename = "crid", default)]
    pub crids: Vec<String>,
    #[serde(rename = "broadcaster", default)]
    pub broadcasters: Vec<String>,
    #[serde(rename = "title", default)]
    pub titles: Vec<Title>,
    #[serde(rename = "ageRating", default, skip_serializing_if = "Option::is_none")]
    pub age_rating: Option<AgeRating>,
    #[serde(default, skip_serializing_if = "Locations::is_empty")]
    pub locations: Locations,
    #[serde(default, skip_serializing_if = "Images::is_empty")]
    pub images: Images,
    #[serde(default, skip_serializing_if = "Segments::is_empty")]
    pub segments: Segments,
}

impl ProgramUpdate {
    pub fn new(program_type: ProgramType, av_type: AvType) -> Self {
        Self {
            xmlns: update_namespace(),
            program_type,
            av_type,
            mid: None,
            deleted: None,
            embeddable: true,
            crids: Vec::new(),
            broadcasters: Vec::new(),
            titles: Vec::new(),
            age_rating: None,
            locations: Locations::default(),
            images: Images::default(),
            segments: Segments::default(),
        }
    }

    /// A mixed audio/video clip with a main title, suitable for all ages.
    pub fn clip(broadcaster: &str, title: impl Into<String>) -> Self {
        Self::new(ProgramType::Clip, AvType::Mixed)
            .with_broadcaster(broadcaster)
            .with_main_title(title)
            .with_age_rating(AgeRating::All)
    }

    pub fn with_mid(mut self, mid: impl Into<String>) -> Self {
        self.mid = Some(mid.into());
        self
    }

    pub fn with_crid(mut self, crid: impl Into<String>) -> Self {
        self.crids.push(crid.into());
        self
    }

    pub fn with_broadcaster(mut self, broadcaster: &str) -> Self {
        self.broadcasters.push(broadcaster.to_string());
        self
    }

    pub fn with_main_title(mut self, title: impl Into<String>) -> Self {
        self.set_main_title(title);
        self
    }

    pub fn with_age_rating(mut self, age_rating: AgeRating) -> Self {
        self.age_rating = Some(age_rating);
        self
    }

    pub fn with_segment(mut self, segment: SegmentUpdate) -> Self {
        self.segments.segment.push(segment);
        self
    }

    pub fn with_location(mut self, location: LocationUpdate) -> Self {
        self.locations.location.push(location);
        self
    }

    pub fn with_image(mut self, image: ImageUpdate) -> Self {
        self.images.image.push(image);
        self
    }

    pub fn main_title(&self) -> Option<&str> {
        self.titles
            .iter()
            .find(|title| title.title_type == TitleType::Main)
            .map(|title| title.value.as_str())
    }

    pub fn set_main_title(&mut self, value: impl Into<String>) {
        self.titles.retain(|title| title.title_type != TitleType::Main);
        self.titles.insert(0, Title::main(value));
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.unwrap_or(false)
    }

    pub fn to_xml(&self) -> Result<String, quick_xml::SeError> {
        quick_xml::se::to_string(self)
    }

    pub fn from_xml(xml: &str) -> Result<Self, quick_xml::DeError> {
        quick_xml::de::from_str(xml)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Segments {
    #[serde(default)]
    pub segment: Vec<SegmentUpdate>,
}

impl Segments {
    pub fn is_empty(&self) -> bool {
        self.segment.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Locations {
    #[serde(default)]
    pub location: Vec<LocationUpdate>,
}

impl Locations {
    pub fn is_empty(&self) -> bool {
        self.location.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Images {
    #[serde(default)]
    pub image: Vec<ImageUpdate>,
}

impl Images {
    pub fn is_empty(&self) -> bool {
        self.image.is_empty()
    }
}

/// A segment, either standalone (with `midRef` to its program) or nested in a program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "segment")]
pub struct SegmentUpdate {
    #[serde(rename = "@xmlns", default = "update_namespace")]
    pub xmlns: String,
    #[serde(rename = "@type")]
    pub segment_type: SegmentType,
    #[serde(rename = "@avType")]
    pub av_type: AvType,
    #[serde(rename = "@midRef", default, skip_serializing_if = "Option::is_none")]
    pub mid_ref: Option<String>,
    #[serde(rename = "@mid", default, skip_serializing_if = "Option::is_none")]
    pub mid: Option<String>,
    #[serde(rename = "broadcaster", default)]
    pub broadcasters: Vec<String>,
    #[serde(rename = "title", default)]
    pub titles: Vec<Title>,
    #[serde(rename = "ageRating", default, skip_serializing_if = "Option::is_none")]
    pub age_rating: Option<AgeRating>,
    #[serde(with = "iso_duration")]
    pub start: Duration,
}

impl SegmentUpdate {
    pub fn new(broadcaster: &str, title: impl Into<String>, start: Duration) -> Self {
        Self {
            xmlns: update_namespace(),
            segment_type: SegmentType::Segment,
            av_type: AvType::Mixed,
            mid_ref: None,
            mid: None,
            broadcasters: vec![broadcaster.to_string()],
            titles: vec![Title::main(title)],
            age_rating: Some(AgeRating::All),
            start,
        }
    }

    pub fn with_mid_ref(mut self, mid_ref: impl Into<String>) -> Self {
        self.mid_ref = Some(mid_ref.into());
        self
    }

    pub fn to_xml(&self) -> Result<String, quick_xml::SeError> {
        quick_xml::se::to_string(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageLocation {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "image")]
pub struct ImageUpdate {
    #[serde(rename = "@xmlns", default = "update_namespace")]
    pub xmlns: String,
    #[serde(rename = "@type")]
    pub image_type: ImageType,
    #[serde(rename = "@urn", default, skip_serializing_if = "Option::is_none")]
    pub urn: Option<String>,
    #[serde(rename = "@highlighted", default)]
    pub highlighted: bool,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(rename = "sourceName", default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<String>,
    #[serde(rename = "imageLocation", default, skip_serializing_if = "Option::is_none")]
    pub image_location: Option<ImageLocation>,
}

impl ImageUpdate {
    /// A CC-BY licensed picture fetched by the backend from `url`.
    pub fn picture(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            xmlns: update_namespace(),
            image_type: ImageType::Picture,
            urn: None,
            highlighted: false,
            title: title.into(),
            description: None,
            source: None,
            source_name: None,
            license: Some(License::CcBy),
            credits: None,
            image_location: Some(ImageLocation { url: url.into() }),
        }
    }

    pub fn with_source(mut self, source_name: &str, source: &str) -> Self {
        self.source_name = Some(source_name.to_string());
        self.source = Some(source.to_string());
        self
    }

    pub fn with_credits(mut self, credits: impl Into<String>) -> Self {
        self.credits = Some(credits.into());
        self
    }

    pub fn to_xml(&self) -> Result<String, quick_xml::SeError> {
        quick_xml::se::to_string(self)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AvAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u32>,
    #[serde(rename = "avFileFormat", default, skip_serializing_if = "Option::is_none")]
    pub av_file_format: Option<AvFileFormat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "location")]
pub struct LocationUpdate {
    #[serde(rename = "@xmlns", default = "update_namespace")]
    pub xmlns: String,
    #[serde(rename = "@urn", default, skip_serializing_if = "Option::is_none")]
    pub urn: Option<String>,
    #[serde(rename = "@publishStart", default, skip_serializing_if = "Option::is_none")]
    pub publish_start: Option<String>,
    #[serde(rename = "@publishStop", default, skip_serializing_if = "Option::is_none")]
    pub publish_stop: Option<String>,
    #[serde(rename = "programUrl")]
    pub program_url: String,
    #[serde(rename = "avAttributes", default, skip_serializing_if = "Option::is_none")]
    pub av_attributes: Option<AvAttributes>,
}

impl LocationUpdate {
    pub fn new(program_url: impl Into<String>, format: AvFileFormat) -> Self {
        Self {
            xmlns: update_namespace(),
            urn: None,
            publish_start: None,
            publish_stop: None,
            program_url: program_url.into(),
            av_attributes: Some(AvAttributes {
                bitrate: None,
                av_file_format: Some(format),
            }),
        }
    }

    pub fn to_xml(&self) -> Result<String, quick_xml::SeError> {
        quick_xml::se::to_string(self)
    }

    pub fn with_bitrate(mut self, bitrate: u32) -> Self {
        self.av_attributes.get_or_insert_with(AvAttributes::default).bitrate = Some(bitrate);
        self
    }

    /// Whether a publication window keeps this location offline right now.
    pub fn is_under_embargo(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        let parse = |value: &Option<String>| {
            value
                .as_deref()
                .and_then(|v| chrono::DateTime::parse_from_rfc3339(v).ok())
                .map(|v| v.with_timezone(&chrono::Utc))
        };
        let started = parse(&self.publish_start).map_or(true, |start| start <= now);
        let stopped = parse(&self.publish_stop).is_some_and(|stop| stop <= now);
        !started || stopped
    }

    /// Removes the publication window.
    pub fn publish(&mut self) {
        self.publish_start = None;
        self.publish_stop = None;
    }
}
