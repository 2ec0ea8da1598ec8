//! The import endpoints on the POMS GUI host ("letterbox").

mod common;

use chrono::NaiveDate;
use reqwest::StatusCode;
use tracing::info;

use poms_apis::MID;
use poms_testutils::letterbox::{
    find_endpoint, Broadcasters, Encryption, NotifyMessage, NotifyType, Restriction,
    TimeRestriction, NEP, PROJECTM_RESTRICTION,
};

fn notify() -> String {
    let timestamp = NaiveDate::from_ymd_opt(2017, 4, 21)
        .unwrap()
        .and_hms_opt(16, 9, 19)
        .unwrap();
    NotifyMessage::new(NotifyType::Online, MID, false, timestamp)
        .to_xml()
        .unwrap()
}

#[tokio::test]
async fn test_letterbox() {
    let Some(letterbox) = common::letterbox() else { return };

    let endpoints = letterbox.list_endpoints().await.unwrap();
    let nep = find_endpoint(&endpoints, NEP)
        .expect("nep endpoint listed")
        .to_string();
    let projectm = find_endpoint(&endpoints, PROJECTM_RESTRICTION)
        .expect("restriction endpoint listed")
        .to_string();

    // wrong password
    let reply = letterbox
        .post_xml_as(&nep, notify(), letterbox.user(), "WRONG PASSWORD")
        .await
        .unwrap();
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let reply = letterbox.post_xml(&nep, notify()).await.unwrap();
    info!("result: {}", reply.body);
    assert_eq!(reply.status, StatusCode::OK);

    // an unknown drm value is a bad request
    let erroneous = notify().replace(r#"drm="false""#, r#"drm="XXX""#);
    let reply = letterbox.post_xml(&nep, erroneous).await.unwrap();
    info!("result: {}", reply.body);
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let day = |y, m, d, h, min, s| {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, min, s))
            .unwrap()
    };
    let restriction = Restriction {
        timestamp: day(2020, 1, 14, 8, 30, 29),
        prid: MID.to_string(),
        prid_export: MID.to_string(),
        title: "Goedemorgen Nederland".to_string(),
        platform: "internetvod".to_string(),
        encryption: Encryption {
            label: "DRM".to_string(),
        },
        time_restriction: TimeRestriction {
            start: day(2000, 1, 1, 1, 0, 0),
            stop: day(2101, 1, 1, 0, 59, 0),
        },
        broadcasters: Broadcasters {
            broadcaster: vec!["WNL".to_string()],
        },
    };
    let reply = letterbox
        .post_xml(&projectm, restriction.to_xml().unwrap())
        .await
        .unwrap();
    info!("Result {}", reply.body);
    assert_eq!(reply.status, StatusCode::OK);
}
