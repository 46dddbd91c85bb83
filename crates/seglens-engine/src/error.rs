use thiserror::Error;

/// Errors returned by the analysis-engine client.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not be reached at all: connect failure, timeout, or a
    /// request that never produced a response.
    #[error("analysis engine unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    /// The engine answered with a failure status. This is an application
    /// error and must never be downgraded to demo mode.
    #[error("analysis engine error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body could not be deserialized into the expected type.
    #[error("unexpected engine response for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Client construction or URL assembly failed.
    #[error("engine client configuration error: {0}")]
    Config(String),
}

impl EngineError {
    /// True for failures where no response was received. Job creation falls
    /// back to demo mode on these and only these.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(self, EngineError::Unreachable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_are_not_connectivity_failures() {
        let err = EngineError::Api {
            status: 422,
            message: "invalid date column".to_string(),
        };
        assert!(!err.is_connectivity());
    }
}
