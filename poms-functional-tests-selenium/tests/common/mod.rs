//! Common test infrastructure
//!
//! GUI tests need a configured environment, credentials for the accounts
//! they log in with and a browser that can be launched. When any of those
//! is missing the accessors log why and return `None`.

#![allow(dead_code)]

use tracing::{info, warn};

use poms_selenium::{Account, BrowserSession, Credentials};
use poms_testutils::{init_logging, Config};

pub fn config() -> Option<Config> {
    init_logging();
    match Config::load() {
        Ok(config) if config.is_configured() => Some(config),
        Ok(_) => {
            info!("No environment configured, skipping");
            None
        }
        Err(e) => {
            warn!("Could not load configuration, skipping: {:#}", e);
            None
        }
    }
}

pub fn credentials(config: &Config, account: Account) -> Option<Credentials> {
    match Credentials::configured(config, account) {
        Ok(credentials) => Some(credentials),
        Err(e) => {
            info!("No {:?} account on {}, skipping: {:#}", account, config.env(), e);
            None
        }
    }
}

pub async fn session(config: &Config) -> Option<BrowserSession> {
    match BrowserSession::launch(config).await {
        Ok(session) => Some(session),
        Err(e) => {
            warn!("No browser available, skipping: {:#}", e);
            None
        }
    }
}
