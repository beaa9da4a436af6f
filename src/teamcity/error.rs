use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(#[from] serde_json::Error),

    #[error("{0} is required")]
    MissingArgument(&'static str),

    #[error("invalid build ID: {0:?}")]
    InvalidBuildId(String),

    #[error("{0}")]
    Validation(String),

    #[error("API error {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("request to TeamCity failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to parse {what} response: {source}")]
    ParseResponse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported resource URI: {0}")]
    UnsupportedResource(String),

    #[error("{context}: {source}")]
    Step {
        context: String,
        #[source]
        source: Box<ClientError>,
    },
}

impl ClientError {
    /// Wrap an error with the step that produced it, e.g. `failed to add tag x`.
    pub fn during(self, context: impl Into<String>) -> Self {
        ClientError::Step {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
