//! Media backend: posting, retrieving, finding and deleting clips.

mod common;

use reqwest::{Method, StatusCode};
use tracing::{info, warn};

use poms_apis::{create_segment, ensure_test_mids, today_range, DynamicSuffix, ACCEPTABLE, MID};
use poms_testutils::backend::OwnerType;
use poms_testutils::media::{MediaForm, ProgramUpdate, VPRO};
use poms_testutils::wait::{wait_until, wait_until_some, wait_until_true, Check};
use poms_testutils::xml;

fn main_title(doc: &str) -> Option<String> {
    xml::texts_with_attribute(doc, &["program", "title"], "type", "MAIN")
        .ok()?
        .into_iter()
        .next()
}

fn deleted(doc: &str) -> Option<String> {
    xml::root_attribute(doc, "deleted").ok().flatten()
}

#[tokio::test]
async fn test_clip_lifecycle() {
    let Some(backend) = common::backend() else { return };
    let suffix = DynamicSuffix::now();
    let title = suffix.title();

    let clip =
        ProgramUpdate::clip(VPRO, &title).with_segment(create_segment(suffix.segment_title()));
    let clip_mid = backend.set(&clip).await.unwrap();
    assert!(clip_mid.starts_with("POMS_VPRO"), "unexpected mid {}", clip_mid);

    let crid = suffix.clip_crid();
    info!("Creating clip with crid {}", crid);
    let clip_with_crid = ProgramUpdate::clip(VPRO, &title)
        .with_crid(&crid)
        .with_segment(create_segment(suffix.segment_title()));
    assert_eq!(backend.set(&clip_with_crid).await.unwrap(), crid);

    let segment = create_segment(suffix.segment_title()).with_mid_ref(&clip_mid);
    let segment_mid = backend.set_segment(&segment).await.unwrap();
    assert!(segment_mid.starts_with("POMS_VPRO"), "unexpected mid {}", segment_mid);

    let backend = &backend;
    let mid = clip_mid.as_str();
    let expected_title = title.clone();
    let doc = wait_until(
        ACCEPTABLE,
        move || async move { Ok::<_, anyhow::Error>(backend.get(mid).await?) },
        &[
            Check::new(format!("main title is {}", title), move |doc: &String| {
                main_title(doc).as_deref() == Some(expected_title.as_str())
            })
            .with_failure_description(|doc: &String| {
                format!("main title is {:?}", main_title(doc))
            }),
            Check::new("not deleted", |doc: &String| deleted(doc).is_none()),
        ],
    )
    .await
    .unwrap();
    info!("{}", doc);

    let by_crid = backend.get_program(&crid).await.unwrap().expect("clip findable by crid");
    assert_eq!(by_crid.main_title(), Some(title.as_str()));
    assert!(!by_crid.is_deleted());

    let (start, stop) = today_range();
    let form = MediaForm::default()
        .with_max(50)
        .with_broadcaster(VPRO)
        .with_creation_range(start, stop)
        .with_title(&title);
    let form = &form;
    let total = wait_until(
        ACCEPTABLE,
        move || async move { Ok::<_, anyhow::Error>(Some(backend.find_total_count(form).await?)) },
        &[Check::new("both clips are found", |total: &u64| *total == 2)],
    )
    .await
    .unwrap();
    assert_eq!(total, 2);

    backend.delete(mid).await.unwrap();
    wait_until_true(ACCEPTABLE, &format!("{} is deleted", mid), move || async move {
        let doc = backend.get(mid).await?;
        Ok::<_, anyhow::Error>(doc.as_deref().and_then(deleted).as_deref() == Some("true"))
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_retrieve_unknown_is_404() {
    let Some(backend) = common::backend() else { return };

    let reply = backend
        .raw(Method::GET, "media/media/BESTAATNIET", &[], None)
        .await
        .unwrap();
    info!("{}", reply.body);

    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert!(backend.get("BESTAATNIET").await.unwrap().is_none());
}

#[tokio::test]
async fn test_streaming_status() {
    let Some(backend) = common::backend() else { return };

    let status = backend.streaming_status(MID).await.unwrap();

    info!("{} -> {:?} (online: {})", MID, status, status.is_online());
}

#[tokio::test]
async fn test_authority_reads_test_mid() {
    let Some(backend) = common::backend() else { return };
    if let Err(e) = ensure_test_mids(&backend).await {
        warn!("Could not prepare test mids: {}", e);
    }
    info!("Using {:?} ({:?})", backend, backend.version_number().await);
    let backend = &backend.with_owner(OwnerType::Authority);

    let program = wait_until_some(ACCEPTABLE, MID, move || async move {
        Ok::<_, anyhow::Error>(backend.get_program(MID).await?)
    })
    .await
    .unwrap();

    assert_eq!(program.mid.as_deref(), Some(MID));
}
