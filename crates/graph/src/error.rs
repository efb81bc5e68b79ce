/// Errors from a single remote catalog request.
#[derive(Debug, thiserror::Error)]
pub enum GraphApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The Graph API returned a non-2xx status code.
    #[error("Graph API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response was not the expected shape.
    #[error("Malformed response: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display() {
        let err = GraphApiError::ApiError {
            status: 400,
            body: "{\"error\":{}}".into(),
        };
        assert_eq!(err.to_string(), "Graph API error (400): {\"error\":{}}");
    }

    #[test]
    fn request_error_display() {
        let req_err = reqwest::Client::new().get("://bad").build().unwrap_err();
        let err = GraphApiError::Request(req_err);
        assert!(err.to_string().contains("HTTP request failed"));
    }
}
