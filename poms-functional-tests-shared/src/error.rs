use reqwest::{Method, StatusCode};
use thiserror::Error;

/// Errors returned by the API clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{method} {url} returned {status}: {body}")]
    Status {
        method: Method,
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("Invalid XML: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("Unreadable XML: {0}")]
    XmlRead(#[from] quick_xml::Error),

    #[error("Could not write XML: {0}")]
    XmlWrite(#[from] quick_xml::SeError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0:#}")]
    Config(#[from] anyhow::Error),
}

impl ApiError {
    /// The HTTP status of an unexpected response, if that is what this is.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Http(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = ApiError::Status {
            method: Method::GET,
            url: "https://api-test.poms.omroep.nl/media/media/BESTAATNIET".to_string(),
            status: StatusCode::NOT_FOUND,
            body: "not found".to_string(),
        };

        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "GET https://api-test.poms.omroep.nl/media/media/BESTAATNIET returned 404 Not Found: not found"
        );
    }

    #[test]
    fn test_config_error_has_no_status() {
        let err = ApiError::from(anyhow::anyhow!("missing password"));
        assert_eq!(err.status(), None);
        assert!(!err.is_not_found());
    }
}
