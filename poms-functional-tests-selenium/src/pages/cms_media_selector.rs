use anyhow::{anyhow, Result};
use chromiumoxide::page::Page;
use tracing::info;

use super::login::{password_box, submit_login, username_box};
use super::{Credentials, PageObject};
use crate::driver::{BrowserSession, Locator};
use poms_testutils::{Config, Prefix};

/// Demo page embedding the selector, as a CMS would.
const EXAMPLE_PATH: &str = "CMSSelector/example/";

/// Fragment of the url the selector popup opens on.
const POPUP_FRAGMENT: &str = "CMSSelector/popup";

fn select_button() -> Locator {
    Locator::css("#select")
}

fn result_field() -> Locator {
    Locator::css("#result")
}

fn result_tables() -> Locator {
    Locator::css("table.search-results")
}

/// A CMS page that lets an editor pick a media object in a POMS popup.
pub struct CmsMediaSelectorPage {
    cms: PageObject,
    popup: Option<PageObject>,
    url: String,
}

impl CmsMediaSelectorPage {
    pub fn new(page: Page, config: &Config) -> Result<Self> {
        Ok(Self {
            cms: PageObject::new(page),
            popup: None,
            url: config.url(Prefix::Poms, EXAMPLE_PATH)?,
        })
    }

    pub async fn open(&self) -> Result<()> {
        self.cms.open(&self.url).await
    }

    /// Opens the selector popup.
    pub async fn click_select(&self) -> Result<()> {
        self.cms.click(&select_button()).await
    }

    pub async fn switch_to_poms_window(&mut self, session: &mut BrowserSession) -> Result<()> {
        session.switch_to(POPUP_FRAGMENT).await?;
        self.popup = Some(PageObject::new(session.current_page().clone()));
        Ok(())
    }

    pub async fn switch_to_cms_window(&mut self, session: &mut BrowserSession) -> Result<()> {
        session.switch_to(EXAMPLE_PATH).await?;
        self.popup = None;
        Ok(())
    }

    fn popup(&self) -> Result<&PageObject> {
        self.popup
            .as_ref()
            .ok_or_else(|| anyhow!("Not switched to the POMS window"))
    }

    /// The popup asks for credentials before showing anything.
    pub async fn check_login_boxes(&self) -> Result<()> {
        let popup = self.popup()?;
        popup.ensure_displayed(&username_box()).await?;
        popup.ensure_displayed(&password_box()).await
    }

    pub async fn check_tables_not_displayed(&self) -> Result<()> {
        self.popup()?.ensure_not_displayed(&result_tables()).await
    }

    /// Logs in in the popup, after which it shows the search screen.
    pub async fn log_in(&self, credentials: &Credentials) -> Result<()> {
        submit_login(self.popup()?, credentials).await
    }

    /// The MID the popup handed back to the CMS page.
    pub async fn result(&self) -> Result<String> {
        let result = self.cms.inner_text(&result_field()).await?;
        info!("Selected {}", result);
        Ok(result)
    }
}
