use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Europe::Amsterdam;
use rand::Rng;
use std::time::Duration;
use tracing::info;

use poms_testutils::media::{
    program_elements_after, AvFileFormat, AvType, ImageUpdate, LocationUpdate, ProgramType, ProgramUpdate,
    SegmentUpdate, VPRO,
};
use poms_testutils::xml::{self, XmlError};
use poms_testutils::{ApiResult, MediaBackendClient};

/// A clip that always exists, titled "testclip michiel".
pub const MID: &str = "WO_VPRO_025057";

/// A clip with at least one published location.
pub const MID_WITH_LOCATIONS: &str = "WO_VPRO_025700";

pub const ANOTHER_MID: &str = "WO_VPRO_4911154";

pub const TITLE_PREFIX: &str = "API_FUNCTIONAL_TEST_";

pub const BASE_CRID: &str = "crid://apitests";

/// How long the backend may take to process an update.
pub const ACCEPTABLE: Duration = Duration::from_secs(5 * 60);

const MID_TITLE: &str = "testclip michiel";

const MID_WITH_LOCATIONS_URL: &str =
    "http://content.omroep.nl/vpro/poms/world/15/04/88/63/NPO_bb.m4v";

/// Makes titles and crids of one test run unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicSuffix {
    suffix: String,
    crid_id: String,
}

impl DynamicSuffix {
    /// A suffix for the current time in Amsterdam, where the backend runs.
    pub fn now() -> Self {
        Self::at(amsterdam_now())
    }

    pub fn at(time: chrono::NaiveDateTime) -> Self {
        let suffix = time.format("%Y-%m-%dT%H:%M:%S%.3f").to_string();
        let crid_id = suffix.chars().filter(char::is_ascii_digit).collect();
        Self { suffix, crid_id }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// The title of everything created with this suffix.
    pub fn title(&self) -> String {
        format!("{}{}", TITLE_PREFIX, self.suffix)
    }

    pub fn segment_title(&self) -> String {
        format!("{}(1) {}", TITLE_PREFIX, self.suffix)
    }

    pub fn crid(&self, media_type: &str) -> String {
        format!("{}/{}/{}", BASE_CRID, media_type, self.crid_id)
    }

    pub fn clip_crid(&self) -> String {
        self.crid("clip")
    }
}

/// Creates the well-known test objects, or repairs them when earlier runs
/// left them in an unusable state.
///
/// Existing objects are repaired by editing their stored document, so
/// whatever other tests or editors added to them stays.
pub async fn ensure_test_mids(backend: &MediaBackendClient) -> ApiResult<()> {
    match backend.get_program(MID).await? {
        None => {
            info!("No media found {}. Now creating", MID);
            backend
                .set(&ProgramUpdate::clip(VPRO, MID_TITLE).with_mid(MID))
                .await?;
        }
        Some(program)
            if !program.broadcasters.iter().any(|b| b == VPRO)
                || program.main_title() != Some(MID_TITLE) =>
        {
            info!("Repairing broadcaster and title of {}", MID);
            backend.edit(MID, repair_mid).await?;
        }
        Some(_) => {}
    }

    let location =
        LocationUpdate::new(MID_WITH_LOCATIONS_URL, AvFileFormat::M4v).with_bitrate(678000);
    match backend.get_program(MID_WITH_LOCATIONS).await? {
        None => {
            info!("No media found {} with locations. Now creating", MID_WITH_LOCATIONS);
            let program = ProgramUpdate::clip(VPRO, "Test")
                .with_mid(MID_WITH_LOCATIONS)
                .with_location(location);
            backend.set(&program).await?;
        }
        Some(program) if program.locations.is_empty() => {
            info!("No locations on {}. Now adding one", MID_WITH_LOCATIONS);
            backend.add_location(MID_WITH_LOCATIONS, &location).await?;
        }
        Some(program) => {
            let now = Utc::now();
            let locations = &program.locations.location;
            if locations.iter().all(|location| location.is_under_embargo(now)) {
                info!(
                    "All locations of {} are under embargo. Publishing them all.",
                    MID_WITH_LOCATIONS
                );
                for location in locations {
                    let mut published = location.clone();
                    published.publish();
                    backend.add_location(MID_WITH_LOCATIONS, &published).await?;
                }
            }
        }
    }

    if backend.get(ANOTHER_MID).await?.is_none() {
        info!("No media found {}. Now creating", ANOTHER_MID);
        let program = ProgramUpdate::new(ProgramType::Clip, AvType::Video)
            .with_broadcaster(VPRO)
            .with_mid(ANOTHER_MID)
            .with_main_title("test");
        backend.set(&program).await?;
    }
    Ok(())
}

/// Makes VPRO the only broadcaster of the stored `doc` of [`MID`] and
/// restores its main title.
fn repair_mid(doc: &str) -> Result<String, XmlError> {
    let doc = xml::replace_children(
        doc,
        |e| xml::is_element(e, "broadcaster"),
        &format!("<broadcaster>{}</broadcaster>", VPRO),
        program_elements_after("broadcaster"),
    )?;
    xml::replace_children(
        &doc,
        |e| xml::is_element(e, "title") && xml::has_attribute(e, "type", "MAIN"),
        &format!(r#"<title type="MAIN">{}</title>"#, MID_TITLE),
        program_elements_after("region"),
    )
}

/// Adds the serialized `image` to the images of a stored program document.
pub fn append_image(doc: &str, image: &str) -> Result<String, XmlError> {
    xml::append_child(doc, "images", image, program_elements_after("images"))
}

/// Drops all images from a stored program document.
pub fn remove_images(doc: &str) -> Result<String, XmlError> {
    xml::replace_children(doc, |e| xml::is_element(e, "images"), "", &[])
}

/// A picture from the POMS image server, distinguishable by `title`.
///
/// `number` selects the image size so consecutive tests post different images.
pub fn random_image(title: &str, number: u32, credits: &str) -> ImageUpdate {
    let url = format!(
        "https://images.poms.omroep.nl/image/s{}/7617.jpg?{}",
        number + 10,
        urlencoding::encode(title)
    );
    info!("Creating image {} ({})", title, url);
    ImageUpdate::picture(title, url)
        .with_source("vpro", "https://www.vpro.nl/")
        .with_credits(credits)
}

/// A number for [`random_image`] when the test has none of its own.
pub fn random_image_number() -> u32 {
    rand::rng().random_range(0..100)
}

/// A standalone segment starting 70 seconds in.
pub fn create_segment(title: impl Into<String>) -> SegmentUpdate {
    SegmentUpdate::new(VPRO, title, Duration::from_secs(70))
}

pub fn create_location(count: u32) -> LocationUpdate {
    LocationUpdate::new(format!("https://www.vpro.nl/{}", count), AvFileFormat::H264)
}

/// The current wall clock time in Amsterdam.
pub fn amsterdam_now() -> NaiveDateTime {
    Utc::now().with_timezone(&Amsterdam).naive_local()
}

/// The current day in Amsterdam, which is the day the schedule uses.
pub fn today() -> NaiveDate {
    amsterdam_now().date()
}

/// Amsterdam midnight of today and of tomorrow, in UTC.
pub fn today_range() -> (DateTime<Utc>, DateTime<Utc>) {
    day_range(today())
}

/// Amsterdam midnight of `day` and of the day after, in UTC.
pub fn day_range(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let next = day.succ_opt().unwrap_or(day);
    (midnight(day), midnight(next))
}

fn midnight(day: NaiveDate) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    midnight
        .and_local_timezone(Amsterdam)
        .earliest()
        .map(|midnight| midnight.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}
