use crate::schema::EntityKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Authentication failed for source '{alias}': {message}")]
    Auth { alias: String, message: String },

    #[error("Fetching {entity} from source '{alias}' failed: {message}")]
    Fetch {
        alias: String,
        entity: EntityKind,
        message: String,
    },

    #[error("Consolidation aborted: {0}")]
    Aggregate(String),

    #[error("Document type '{0}' is not valid or not implemented")]
    InvalidDocumentType(String),

    #[error("Entity type '{0}' is not valid")]
    InvalidEntityType(String),

    #[error("{kind} with code '{id}' was not found")]
    NotFound { kind: String, id: String },

    #[error("Unknown source id {0}")]
    UnknownSource(i64),

    #[error("Invalid reporting window: {0}")]
    InvalidWindow(String),

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "http-client")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl AnalyticsError {
    /// Alias of the source the failure is attributed to, when there is one.
    pub fn source_alias(&self) -> Option<&str> {
        match self {
            AnalyticsError::Auth { alias, .. } | AnalyticsError::Fetch { alias, .. } => {
                Some(alias)
            }
            _ => None,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, AnalyticsError::Auth { .. })
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
