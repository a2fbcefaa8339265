use serde::{Deserialize, Serialize};

/// Error details in a failed API response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Envelope of every non-2xx JSON response: `{"error": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ApiErrorDetail,
}

impl ErrorEnvelope {
    /// Parses an error body, returning `None` if it is not an error envelope.
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_google_style_error() {
        let body = r#"{"error":{"code":400,"message":"bad manifest","status":"INVALID_ARGUMENT"}}"#;
        let env = ErrorEnvelope::parse(body).unwrap();
        assert_eq!(env.error.code, 400);
        assert_eq!(env.error.message, "bad manifest");
        assert_eq!(env.error.status.as_deref(), Some("INVALID_ARGUMENT"));
    }

    #[test]
    fn non_envelope_body_is_none() {
        assert!(ErrorEnvelope::parse("<html>Bad Gateway</html>").is_none());
        assert!(ErrorEnvelope::parse(r#"{"message":"x"}"#).is_none());
    }
}
