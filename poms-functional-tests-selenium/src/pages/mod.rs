//! Page objects for the screens of the POMS GUI.

mod broadcasters_overlay;
mod cms_media_selector;
mod login;
mod search;

pub use broadcasters_overlay::BroadcastersOverlayPage;
pub use cms_media_selector::CmsMediaSelectorPage;
pub use login::{Account, Credentials, LoginPage};
pub use search::{SearchPage, BROADCASTER_CELLS, TYPE_CELLS};

use anyhow::{bail, Result};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::driver::Locator;
use poms_testutils::Waiter;

/// How long an element may take to show up.
pub const ELEMENT_TIMEOUT: Duration = Duration::from_secs(30);

const ELEMENT_INTERVAL: Duration = Duration::from_millis(250);

// true once angular has no outstanding $http requests, or when the page
// doesn't use angular at all
const ANGULAR_IDLE: &str = r#"(function() {
    if (window.angular === undefined) { return true; }
    var injector = window.angular.element(document.body).injector();
    if (!injector) { return true; }
    return injector.get('$http').pendingRequests.length === 0;
})()"#;

/// Elements have no useful `Debug`, the waiter only needs one for logging.
struct Found<T>(T);

impl<T> fmt::Debug for Found<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("found")
    }
}

/// An xpath string literal for `value`, which may contain either quote.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{}'", value)
    } else if !value.contains('"') {
        format!("\"{}\"", value)
    } else {
        let parts: Vec<String> = value.split('\'').map(|part| format!("'{}'", part)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// Element interactions shared by all pages, each waiting for its element.
#[derive(Clone)]
pub struct PageObject {
    page: Page,
    waiter: Waiter,
}

impl PageObject {
    pub fn new(page: Page) -> Self {
        Self {
            page,
            waiter: Waiter::new(ELEMENT_TIMEOUT)
                .with_interval(ELEMENT_INTERVAL)
                .with_initial_delay(Duration::ZERO),
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub async fn open(&self, url: &str) -> Result<()> {
        debug!("Opening {}", url);
        self.page.goto(url).await?;
        self.wait_for_angular().await
    }

    /// The first element matching `locator`, once there is one.
    pub async fn wait_for(&self, locator: &Locator) -> Result<Element> {
        let page = &self.page;
        let found = self
            .waiter
            .until_some(&locator.to_string(), move || async move {
                Ok::<_, anyhow::Error>(locator.find(page).await.ok().map(Found))
            })
            .await?;
        Ok(found.0)
    }

    /// All elements matching `locator`, once there is at least one.
    pub async fn wait_for_all(&self, locator: &Locator) -> Result<Vec<Element>> {
        let page = &self.page;
        let found = self
            .waiter
            .until_some(&locator.to_string(), move || async move {
                let elements = locator.find_all(page).await.unwrap_or_default();
                Ok::<_, anyhow::Error>(Some(elements).filter(|e| !e.is_empty()).map(Found))
            })
            .await?;
        Ok(found.0)
    }

    pub async fn click(&self, locator: &Locator) -> Result<()> {
        self.wait_for_angular().await?;
        debug!("Clicking {}", locator);
        self.wait_for(locator).await?.click().await?;
        Ok(())
    }

    pub async fn type_text(&self, locator: &Locator, text: &str) -> Result<()> {
        let element = self.wait_for(locator).await?;
        element.click().await?;
        element.type_str(text).await?;
        Ok(())
    }

    /// Trimmed text content of the element.
    pub async fn inner_text(&self, locator: &Locator) -> Result<String> {
        let text = self.wait_for(locator).await?.inner_text().await?;
        Ok(text.unwrap_or_default().trim().to_string())
    }

    /// Whether the element exists and takes up space in the layout.
    pub async fn is_displayed(&self, locator: &Locator) -> Result<bool> {
        let expression = format!(
            "(function() {{ var e = {}; return e !== null && e.offsetParent !== null; }})()",
            locator.js_first()
        );
        Ok(self.page.evaluate(expression).await?.into_value::<bool>()?)
    }

    pub async fn ensure_displayed(&self, locator: &Locator) -> Result<()> {
        self.wait_for(locator).await?;
        if !self.is_displayed(locator).await? {
            bail!("{} is not displayed", locator);
        }
        Ok(())
    }

    pub async fn ensure_not_displayed(&self, locator: &Locator) -> Result<()> {
        if self.is_displayed(locator).await? {
            bail!("{} is displayed", locator);
        }
        Ok(())
    }

    /// Waits until angular finished its pending requests.
    pub async fn wait_for_angular(&self) -> Result<()> {
        let page = &self.page;
        self.waiter
            .until_true("angular is idle", move || async move {
                Ok::<_, anyhow::Error>(page.evaluate(ANGULAR_IDLE).await?.into_value::<bool>()?)
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xpath_literal() {
        assert_eq!(xpath_literal("TROS"), "'TROS'");
        assert_eq!(xpath_literal("Sinterklaas' journaal"), "\"Sinterklaas' journaal\"");
        assert_eq!(
            xpath_literal(r#"it's "quoted""#),
            r#"concat('it', "'", 's "quoted"')"#
        );
    }
}
