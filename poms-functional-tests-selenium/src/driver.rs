use anyhow::{anyhow, Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::fmt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use poms_testutils::{Config, Prefix, Waiter};

/// How long to look for a window before giving up.
pub const WINDOW_TIMEOUT: Duration = Duration::from_secs(20);

/// How to find an element on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        Locator::XPath(expression.into())
    }

    /// The first matching element.
    pub async fn find(&self, page: &Page) -> Result<Element> {
        let element = match self {
            Locator::Css(selector) => page.find_element(selector.as_str()).await?,
            Locator::XPath(expression) => page.find_xpath(expression.as_str()).await?,
        };
        Ok(element)
    }

    /// All matching elements in document order.
    pub async fn find_all(&self, page: &Page) -> Result<Vec<Element>> {
        let elements = match self {
            Locator::Css(selector) => page.find_elements(selector.as_str()).await?,
            Locator::XPath(expression) => page.find_xpaths(expression.as_str()).await?,
        };
        Ok(elements)
    }

    /// A javascript expression evaluating to the first match, or `null`.
    pub fn js_first(&self) -> String {
        match self {
            Locator::Css(selector) => {
                format!("document.querySelector({})", js_string(selector))
            }
            Locator::XPath(expression) => format!(
                "document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
                js_string(expression)
            ),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(selector) => write!(f, "css={}", selector),
            Locator::XPath(expression) => write!(f, "xpath={}", expression),
        }
    }
}

fn js_string(value: &str) -> String {
    // a json string is a valid javascript string literal
    serde_json::Value::String(value.to_string()).to_string()
}

/// An open browser tab and the url it showed when found.
struct Window {
    url: String,
    page: Page,
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window").field("url", &self.url).finish()
    }
}

async fn find_window(browser: &Browser, url_fragment: &str) -> Result<Option<Window>> {
    for page in browser.pages().await? {
        if let Some(url) = page.url().await? {
            debug!("Window {}", url);
            if url.contains(url_fragment) {
                return Ok(Some(Window { url, page }));
            }
        }
    }
    Ok(None)
}

/// A Chromium instance and the tab the page objects currently act on.
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    current: Page,
}

impl BrowserSession {
    /// Starts a browser as configured in the `selenium` section.
    ///
    /// `headless` defaults to true, `chrome` points at the executable when
    /// it is not on the path.
    pub async fn launch(config: &Config) -> Result<Self> {
        let headless = config
            .config_option(Prefix::Selenium, "headless")
            .map_or(true, |value| !matches!(value.as_str(), "false" | "0" | "no"));

        let mut builder = BrowserConfig::builder()
            .window_size(1280, 1024)
            .arg("--disable-gpu")
            .arg("--no-sandbox");
        if !headless {
            builder = builder.with_head();
        }
        if config.relaxed_https() {
            builder = builder.arg("--ignore-certificate-errors");
        }
        if let Some(chrome) = config.config_option(Prefix::Selenium, "chrome") {
            builder = builder.chrome_executable(chrome);
        }
        let browser_config = builder.build().map_err(|e| anyhow!("{}", e))?;

        info!("Launching browser (headless: {})", headless);
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .context("Could not launch browser")?;
        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });
        let current = browser.new_page("about:blank").await?;

        Ok(Self {
            browser,
            handler,
            current,
        })
    }

    /// Navigates the current tab to `url`.
    pub async fn open(&self, url: &str) -> Result<()> {
        info!("Opening {}", url);
        self.current.goto(url).await?;
        Ok(())
    }

    pub fn current_page(&self) -> &Page {
        &self.current
    }

    /// Makes the tab whose url contains `url_fragment` the current one,
    /// waiting for it to appear (popups open asynchronously).
    pub async fn switch_to_window(&mut self, url_fragment: &str, waiter: Waiter) -> Result<()> {
        let browser = &self.browser;
        let window = waiter
            .until_some(&format!("window at *{}*", url_fragment), move || {
                find_window(browser, url_fragment)
            })
            .await?;
        info!("Switching to {}", window.url);
        window.page.bring_to_front().await?;
        self.current = window.page;
        Ok(())
    }

    /// [`BrowserSession::switch_to_window`] polling every half second.
    pub async fn switch_to(&mut self, url_fragment: &str) -> Result<()> {
        let waiter = Waiter::new(WINDOW_TIMEOUT)
            .with_interval(Duration::from_millis(500))
            .with_initial_delay(Duration::ZERO);
        self.switch_to_window(url_fragment, waiter).await
    }

    pub async fn close(mut self) -> Result<()> {
        self.browser.close().await?;
        self.browser.wait().await?;
        self.handler.abort();
        Ok(())
    }
}
