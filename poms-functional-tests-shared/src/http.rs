//! Request plumbing shared by the API clients.

use reqwest::{Method, RequestBuilder, StatusCode};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};

/// Timeouts of the underlying HTTP client.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub socket: Duration,
    pub connect: Duration,
    /// Calls slower than this are logged at warn level.
    pub warn_threshold: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            socket: Duration::from_secs(300),
            connect: Duration::from_secs(10),
            warn_threshold: Duration::from_secs(10),
        }
    }
}

pub(crate) fn build_client(timeouts: &Timeouts, relaxed_https: bool) -> ApiResult<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(timeouts.socket)
        .connect_timeout(timeouts.connect)
        .danger_accept_invalid_certs(relaxed_https)
        .build()?;
    Ok(client)
}

/// A response reduced to what the tests look at.
#[derive(Debug, Clone)]
pub struct Reply {
    pub method: Method,
    pub url: String,
    pub status: StatusCode,
    pub body: String,
}

impl Reply {
    /// Fails unless the status is `expected`.
    pub fn expect(self, expected: StatusCode) -> ApiResult<Self> {
        if self.status == expected {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }

    pub fn expect_success(self) -> ApiResult<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }

    pub fn into_error(self) -> ApiError {
        ApiError::Status {
            method: self.method,
            url: self.url,
            status: self.status,
            body: self.body,
        }
    }
}

/// Sends `request`, logging the exchange and how long it took.
pub(crate) async fn send(
    request: RequestBuilder,
    method: Method,
    url: &str,
    warn_threshold: Duration,
) -> ApiResult<Reply> {
    let start = Instant::now();
    debug!("{} {}", method, url);
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    let took = start.elapsed();
    if took > warn_threshold {
        warn!("{} {} took {:?} -> {}", method, url, took, status);
    } else {
        debug!("{} {} took {:?} -> {}", method, url, took, status);
    }
    Ok(Reply {
        method,
        url: url.to_string(),
        status,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(status: StatusCode) -> Reply {
        Reply {
            method: Method::POST,
            url: "https://api-test.poms.omroep.nl/media/media".to_string(),
            status,
            body: "POMS_VPRO_1".to_string(),
        }
    }

    #[test]
    fn test_expect() {
        assert!(reply(StatusCode::ACCEPTED).expect(StatusCode::ACCEPTED).is_ok());

        let err = reply(StatusCode::OK).expect(StatusCode::ACCEPTED).unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::OK));
    }

    #[test]
    fn test_expect_success() {
        assert!(reply(StatusCode::NO_CONTENT).expect_success().is_ok());
        assert!(reply(StatusCode::UNAUTHORIZED).expect_success().is_err());
    }
}
