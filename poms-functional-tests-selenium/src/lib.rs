//! Page objects for the POMS GUI
//!
//! A [`BrowserSession`] drives a Chromium instance over the DevTools
//! protocol. The page objects in [`pages`] wrap the screens the GUI tests
//! walk through: the login form, the search screen, the CMS media selector
//! popup and the broadcasters overlay.

pub mod driver;
pub mod pages;

pub use driver::{BrowserSession, Locator};
pub use pages::{
    Account, BroadcastersOverlayPage, CmsMediaSelectorPage, Credentials, LoginPage, SearchPage,
};
