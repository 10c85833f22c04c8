use thiserror::Error;

/// Failure to fetch data for a single ticker. Always recovered per ticker.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("provider error for {symbol}: {reason}")]
    Provider { symbol: String, reason: String },

    #[error("no data returned for {0}")]
    NoData(String),

    #[error("could not obtain session crumb")]
    MissingCrumb,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProviderError::Provider {
            symbol: "XXXX".to_string(),
            reason: "Quote not found for symbol: XXXX".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "provider error for XXXX: Quote not found for symbol: XXXX"
        );

        let err = ProviderError::Status { status: 429, detail: "Too Many Requests".into() };
        assert_eq!(err.to_string(), "HTTP 429: Too Many Requests");
    }
}
