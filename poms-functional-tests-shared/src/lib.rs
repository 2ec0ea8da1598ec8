//! POMS functional test utilities
//!
//! Configuration of the environment under test, clients for the deployed
//! APIs and the polling utility the acceptance tests wait with.

pub mod backend;
pub mod config;
pub mod error;
pub mod forms;
pub mod http;
pub mod letterbox;
pub mod logging;
pub mod media;
pub mod npo_api;
pub mod wait;
pub mod xml;

// Re-export commonly used types for convenience
pub use backend::MediaBackendClient;
pub use config::{Config, Env, Prefix};
pub use error::{ApiError, ApiResult};
pub use letterbox::LetterBoxClient;
pub use logging::init_logging;
pub use npo_api::NpoApiClient;
pub use wait::{wait_until, wait_until_some, wait_until_true, Check, WaitError, Waiter};
