use anyhow::Result;
use chromiumoxide::page::Page;
use std::fmt;
use tracing::info;

use super::PageObject;
use crate::driver::Locator;
use poms_testutils::{Config, Prefix};

/// The kinds of GUI users the tests log in as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Account {
    /// A regular NPO user.
    Npo,
    /// An NPO user with extra (admin) rights.
    SpecialNpo,
}

impl Account {
    fn key(&self) -> &'static str {
        match self {
            Account::Npo => "npo",
            Account::SpecialNpo => "special-npo",
        }
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    /// `<account>-user` and `<account>-password` from the `selenium` section.
    pub fn configured(config: &Config, account: Account) -> Result<Self> {
        let user = config.required_option(Prefix::Selenium, &format!("{}-user", account.key()))?;
        let password =
            config.required_option(Prefix::Selenium, &format!("{}-password", account.key()))?;
        Ok(Self::new(user, password))
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

pub(crate) fn username_box() -> Locator {
    Locator::css("input#username")
}

pub(crate) fn password_box() -> Locator {
    Locator::css("input#password")
}

fn submit_button() -> Locator {
    Locator::css("input[type=submit], button[type=submit]")
}

/// Fills in and submits the login form shown on `page`.
pub(crate) async fn submit_login(page: &PageObject, credentials: &Credentials) -> Result<()> {
    info!("Logging in as {}", credentials.user);
    page.type_text(&username_box(), &credentials.user).await?;
    page.type_text(&password_box(), credentials.password()).await?;
    page.click(&submit_button()).await?;
    page.wait_for_angular().await
}

/// The login form in front of the POMS GUI.
pub struct LoginPage {
    page: PageObject,
    home_url: String,
    logout_url: String,
}

impl LoginPage {
    pub fn new(page: Page, config: &Config) -> Result<Self> {
        Ok(Self {
            page: PageObject::new(page),
            home_url: config.base_url(Prefix::Poms)?,
            logout_url: config.url(Prefix::Poms, "logout")?,
        })
    }

    pub async fn login_as(&self, credentials: &Credentials) -> Result<()> {
        self.page.open(&self.home_url).await?;
        submit_login(&self.page, credentials).await
    }

    pub async fn logout(&self) -> Result<()> {
        info!("Logging out");
        self.page.open(&self.logout_url).await
    }
}
