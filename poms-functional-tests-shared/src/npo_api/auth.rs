//! NPO API request signing.
//!
//! Every request carries its date and origin, and an `Authorization` header
//! holding an HMAC over both, the request path and the sorted query
//! parameters, keyed with the client's secret.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{ApiError, ApiResult};

type HmacSha256 = Hmac<Sha256>;

pub const DATE_HEADER: &str = "X-NPO-Date";

/// Credentials issued for the NPO frontend API.
#[derive(Clone)]
pub struct ApiKey {
    pub key: String,
    secret: String,
    pub origin: String,
}

impl ApiKey {
    pub fn new(key: impl Into<String>, secret: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
            origin: origin.into(),
        }
    }

    /// The three headers to send along with a request for `path` with `params`.
    pub fn headers(
        &self,
        path: &str,
        params: &[(&str, String)],
        now: DateTime<Utc>,
    ) -> ApiResult<Vec<(&'static str, String)>> {
        let date = http_date(now);
        let signature = sign(&self.secret, &message(&self.origin, &date, path, params))?;
        Ok(vec![
            ("Authorization", format!("NPO {}:{}", self.key, signature)),
            (DATE_HEADER, date),
            ("Origin", self.origin.clone()),
        ])
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKey")
            .field("key", &self.key)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// RFC 1123 date as expected in `X-NPO-Date`.
pub fn http_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

pub fn message(origin: &str, date: &str, path: &str, params: &[(&str, String)]) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let mut message = format!("origin:{},x-npo-date:{},uri:{}", origin, date, path);
    for (key, value) in sorted {
        message.push_str(&format!(",{}:{}", key, value));
    }
    message
}

/// Base64 HMAC-SHA256 of `message`.
pub fn sign(secret: &str, message: &str) -> ApiResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ApiError::from(anyhow::anyhow!("Invalid NPO API secret: {}", e)))?;
    mac.update(message.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 4, 21, 14, 9, 19).unwrap()
    }

    #[test]
    fn test_http_date() {
        assert_eq!(http_date(now()), "Fri, 21 Apr 2017 14:09:19 GMT");
    }

    #[test]
    fn test_message_sorts_params() {
        let params = [("max", "10".to_string()), ("guideDay", "2017-04-21".to_string())];
        assert_eq!(
            message("https://www.vpro.nl", "Fri, 21 Apr 2017 14:09:19 GMT", "/v1/api/schedule", &params),
            "origin:https://www.vpro.nl,x-npo-date:Fri, 21 Apr 2017 14:09:19 GMT,uri:/v1/api/schedule,guideDay:2017-04-21,max:10"
        );
    }

    #[test]
    fn test_sign() {
        // RFC 4231 test case 2
        assert_eq!(
            sign("Jefe", "what do ya want for nothing?").unwrap(),
            "W9zBRr9gdU5qBCQmCJV1x1oAPwidJzmDnexYuWTsOEM="
        );
    }

    #[test]
    fn test_sign_accepts_any_secret_length() {
        assert!(sign("", "message").is_ok());
        assert!(sign(&"x".repeat(200), "message").is_ok());
    }

    #[test]
    fn test_headers() {
        let key = ApiKey::new("ione7ahfij", "secret", "https://www.vpro.nl");
        let headers = key.headers("/v1/api/media/BESTAATNIET", &[], now()).unwrap();

        assert_eq!(headers.len(), 3);
        assert!(headers[0].1.starts_with("NPO ione7ahfij:"));
        assert_eq!(headers[1], (DATE_HEADER, "Fri, 21 Apr 2017 14:09:19 GMT".to_string()));
        assert_eq!(headers[2], ("Origin", "https://www.vpro.nl".to_string()));
        assert!(!format!("{:?}", key).contains("secret"));
    }
}
