//! Fixtures shared by the API acceptance tests.
//!
//! The tests run against a deployed environment, so the objects they rely on
//! are created (or repaired) on the fly and everything new gets a title and
//! crid derived from the moment the test run started.

pub mod fixtures;

pub use fixtures::{
    amsterdam_now, append_image, create_location, create_segment, day_range, ensure_test_mids,
    random_image, random_image_number, remove_images, today, today_range, DynamicSuffix,
    ACCEPTABLE, ANOTHER_MID, BASE_CRID, MID, MID_WITH_LOCATIONS, TITLE_PREFIX,
};

use std::path::PathBuf;

/// Directory holding the media search forms shipped with this crate.
pub fn media_forms_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("forms")
        .join("media")
}
