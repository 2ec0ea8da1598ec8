//! Media backend: adding images to a program and removing them again.

mod common;

use chrono::Utc;
use std::time::Duration;
use tracing::{info, warn};

use poms_apis::{
    append_image, ensure_test_mids, random_image, random_image_number, remove_images, MID,
};
use poms_testutils::media::ProgramUpdate;
use poms_testutils::wait::{wait_until, wait_until_true, Check};
use poms_testutils::MediaBackendClient;

const ACCEPTABLE: Duration = Duration::from_secs(3 * 60);
const CREDITS: &str = "backend_images_tests";

fn image_titles(program: &ProgramUpdate) -> Vec<String> {
    program.images.image.iter().map(|image| image.title.clone()).collect()
}

async fn wait_for_image(backend: &MediaBackendClient, title: &str) -> ProgramUpdate {
    let expected = title.to_string();
    wait_until(
        ACCEPTABLE,
        move || async move { Ok::<_, anyhow::Error>(backend.get_program(MID).await?) },
        &[Check::new(format!("{} has image {}", MID, title), move |program: &ProgramUpdate| {
            image_titles(program).contains(&expected)
        })
        .with_failure_description(|program: &ProgramUpdate| {
            format!("images are {:?}", image_titles(program))
        })],
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_add_and_remove_images() {
    let Some(backend) = common::backend() else { return };
    if let Err(e) = ensure_test_mids(&backend).await {
        warn!("Could not prepare test mids: {}", e);
    }
    let backend = &backend;
    let run = Utc::now().to_rfc3339();
    let number = random_image_number();

    let title = format!("{} add image", run);
    backend
        .add_image(MID, &random_image(&title, number, CREDITS))
        .await
        .unwrap();
    wait_for_image(backend, &title).await;

    let title = format!("{} add image to object", run);
    let image = random_image(&title, number + 1, CREDITS).to_xml().unwrap();
    backend
        .edit(MID, |doc| append_image(doc, &image))
        .await
        .unwrap()
        .expect("test mid exists");
    let program = wait_for_image(backend, &title).await;
    info!("{} now has images {:?}", MID, image_titles(&program));

    backend.edit(MID, remove_images).await.unwrap();
    wait_until_true(ACCEPTABLE, &format!("{} has no images", MID), move || async move {
        let program = backend.get_program(MID).await?;
        Ok::<_, anyhow::Error>(program.is_some_and(|program| program.images.is_empty()))
    })
    .await
    .unwrap();
}
