//! The CMS media selector: picking a media object in a POMS popup.

mod common;

use poms_selenium::pages::{BROADCASTER_CELLS, TYPE_CELLS};
use poms_selenium::{
    Account, BrowserSession, CmsMediaSelectorPage, Credentials, Locator, LoginPage, SearchPage,
};
use poms_testutils::Config;

/// Opens the selector popup and logs in there.
async fn open_selector(
    session: &mut BrowserSession,
    config: &Config,
    npo: &Credentials,
) -> CmsMediaSelectorPage {
    let mut cms = CmsMediaSelectorPage::new(session.current_page().clone(), config).unwrap();
    cms.open().await.unwrap();
    cms.click_select().await.unwrap();
    cms.switch_to_poms_window(session).await.unwrap();
    cms.check_login_boxes().await.unwrap();
    cms.check_tables_not_displayed().await.unwrap();
    cms.log_in(npo).await.unwrap();
    cms
}

#[tokio::test]
async fn test_selector_returns_selected_mid() {
    let Some(config) = common::config() else { return };
    let Some(special) = common::credentials(&config, Account::SpecialNpo) else { return };
    let Some(npo) = common::credentials(&config, Account::Npo) else { return };
    let Some(mut session) = common::session(&config).await else { return };

    let login = LoginPage::new(session.current_page().clone(), &config).unwrap();
    login.login_as(&special).await.unwrap();
    login.logout().await.unwrap();

    let mut cms = open_selector(&mut session, &config, &npo).await;

    let search = SearchPage::new(session.current_page().clone());
    search.add_or_remove_column("MID").await.unwrap();
    let mid = search.mid_from_column(1).await.unwrap();
    search.click_row(0).await.unwrap();

    cms.switch_to_cms_window(&mut session).await.unwrap();
    assert_eq!(cms.result().await.unwrap(), mid);

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_selector_search_filters() {
    let Some(config) = common::config() else { return };
    let Some(npo) = common::credentials(&config, Account::Npo) else { return };
    let Some(mut session) = common::session(&config).await else { return };

    open_selector(&mut session, &config, &npo).await;
    let search = SearchPage::new(session.current_page().clone());

    search.select_option_from_menu("MediaType", "Uitzending").await.unwrap();
    search.click_on_column("Type").await.unwrap();
    let rows = search
        .rows_with_text_equal(&Locator::xpath(TYPE_CELLS), "Uitzending")
        .await
        .unwrap();
    assert!(rows > 0);
    search.remove_selected_option("Uitzending").await.unwrap();

    search.select_option_from_menu("Omroepen", "TROS").await.unwrap();
    search.add_or_remove_column("Omroep").await.unwrap();
    let rows = search
        .rows_with_text_equal(&Locator::xpath(BROADCASTER_CELLS), "TROS")
        .await
        .unwrap();
    assert!(rows > 0);
    search.remove_selected_option("TROS").await.unwrap();

    session.close().await.unwrap();
}
