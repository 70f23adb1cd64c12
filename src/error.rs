use thiserror::Error;

/// Main error type for the fleet manager
#[derive(Error, Debug)]
pub enum FleetError {
    /// Filesystem errors (bot directories, unit files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Cluster list rejected by the validator
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ValidationError),

    /// External command exited non-zero
    #[error("Command `{command}` failed with exit code {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    /// External command could not be started at all
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Provisioning aborted because shutdown was requested
    #[error("Shutdown requested")]
    ShutdownRequested,

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<String> for FleetError {
    fn from(s: String) -> Self {
        FleetError::Other(s)
    }
}

impl From<&str> for FleetError {
    fn from(s: &str) -> Self {
        FleetError::Other(s.to_string())
    }
}

/// A single violation found while validating a cluster batch
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field '{field}' in {name}")]
    MissingField { name: String, field: &'static str },

    #[error("Invalid git_url for {name}: {url}")]
    InvalidGitUrl { name: String, url: String },

    #[error("Invalid bot_number format for {name}: {bot_number}")]
    InvalidBotNumber { name: String, bot_number: String },

    #[error("Duplicate bot suffix found: {suffix} in {bot_number}")]
    DuplicateSuffix { suffix: String, bot_number: String },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, FleetError>;
