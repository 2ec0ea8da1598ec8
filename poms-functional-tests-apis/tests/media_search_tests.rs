//! Frontend API: every shipped media form against find, members and episodes.

mod common;

use tracing::info;

use poms_apis::media_forms_dir;
use poms_testutils::forms::{load_forms, NamedForm};
use poms_testutils::npo_api::MediaSearchResult;

const GROUP: &str = "POMS_S_VPRO_417550";
const SERIES: &str = "AVRO_1656037";
const PROFILES: [Option<&str>; 2] = [None, Some("vpro")];

/// Assertions specific to a form, for searches without profile.
fn check_form(name: &str, result: &MediaSearchResult) {
    match name {
        "clips.json" => {
            for item in &result.items {
                assert_eq!(item.result.media_type.as_deref(), Some("CLIP"), "{}", item.result.mid);
            }
        }
        "facet-relations-and-filter.json" => {
            let relations = result
                .facets
                .as_ref()
                .and_then(|facets| facets.relations.as_ref())
                .expect("relation facets");
            assert_eq!(relations[0].name, "labels");
        }
        "facet-ageRating.json" => {
            let age_ratings = result
                .facets
                .as_ref()
                .and_then(|facets| facets.age_ratings.as_ref())
                .expect("age rating facets");
            let ids: Vec<&str> = age_ratings
                .iter()
                .filter_map(|item| item.id.as_deref())
                .collect();
            assert_eq!(ids, vec!["6", "9", "12", "16", "ALL"]);
        }
        "facet-relations-and-subsearch.json" => {
            let relations = result
                .facets
                .as_ref()
                .and_then(|facets| facets.relations.as_ref())
                .expect("relation facets");
            assert_eq!(relations.len(), 2);
            assert_eq!(relations[0].name, "labels");
            for facet in &relations[0].facets {
                info!("{:?}", facet);
            }
        }
        _ => {}
    }
}

fn forms() -> Vec<NamedForm> {
    let forms = load_forms(&media_forms_dir()).unwrap();
    assert!(!forms.is_empty());
    forms
}

#[test]
fn test_shipped_forms_parse() {
    let names: Vec<String> = forms().into_iter().map(|form| form.name).collect();
    assert_eq!(
        names,
        vec![
            "clips.json",
            "facet-ageRating.json",
            "facet-relations-and-filter.json",
            "facet-relations-and-subsearch.json",
        ]
    );
}

#[tokio::test]
async fn test_search() {
    let Some(api) = common::npo_api() else { return };

    for NamedForm { name, form } in forms() {
        for profile in PROFILES {
            info!("-------------------- {}/{:?}", name, profile);
            let result = api.find(&form, profile, 0, 10).await.unwrap();
            if profile.is_none() {
                check_form(&name, &result);
            }
        }
    }
}

#[tokio::test]
async fn test_search_members() {
    let Some(api) = common::npo_api() else { return };

    for NamedForm { name, form } in forms() {
        for profile in PROFILES {
            info!("----------------MEMBERS---- {}/{:?}", name, profile);
            let result = api.find_members(&form, GROUP, profile, 0, 10).await.unwrap();
            if profile.is_none() {
                check_form(&name, &result);
            }
        }
    }
}

#[tokio::test]
async fn test_search_episodes() {
    let Some(api) = common::npo_api() else { return };

    for NamedForm { name, form } in forms() {
        for profile in PROFILES {
            info!("--------------------EPISODES--- {}/{:?}", name, profile);
            let result = api.find_episodes(&form, SERIES, profile, 0, 10).await.unwrap();
            info!("{} episodes of {}", result.size(), SERIES);
        }
    }
}
