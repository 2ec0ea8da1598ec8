//! Common test infrastructure
//!
//! The acceptance tests talk to a deployed environment. When none is
//! configured (no config file and no `POMS_ENV`), or a credential a test
//! needs is missing, the accessors here log why and return `None` so the
//! test can return early instead of failing.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//!
//! #[tokio::test]
//! async fn test_version() {
//!     let Some(backend) = common::backend() else { return };
//!     assert!(!backend.version().await.unwrap().is_empty());
//! }
//! ```

#![allow(dead_code)]

use tracing::{info, warn};

use poms_testutils::{
    init_logging, ApiResult, Config, LetterBoxClient, MediaBackendClient, NpoApiClient,
};

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

fn configured<T>(what: &str, create: impl FnOnce(&Config) -> ApiResult<T>) -> Option<T> {
    let config = config()?;
    match create(&config) {
        Ok(client) => Some(client),
        Err(e) => {
            info!("No {} available on {}, skipping: {}", what, config.env(), e);
            None
        }
    }
}

pub fn backend() -> Option<MediaBackendClient> {
    configured("media backend", MediaBackendClient::configured)
}

pub fn letterbox() -> Option<LetterBoxClient> {
    configured("letterbox", LetterBoxClient::configured)
}

pub fn npo_api() -> Option<NpoApiClient> {
    configured("frontend api", NpoApiClient::configured)
}
