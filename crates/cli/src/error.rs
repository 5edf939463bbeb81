//! Errors surfaced by `murmur` commands.

use murmur_client::PostsApiError;
use murmur_core::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration could not be loaded or is missing a required value.
    #[error("CONFIG: {0}")]
    Config(#[from] ConfigError),

    /// HTTP client could not be built.
    #[error("CLIENT: {0}")]
    Client(#[from] PostsApiError),

    /// Cache or mutation failure.
    #[error(transparent)]
    Feed(#[from] murmur_core::Error),

    /// Response could not be rendered.
    #[error("OUTPUT: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Config(_) => 2,
            CliError::Client(_) => 3,
            CliError::Feed(_) => 4,
            CliError::Output(_) => 5,
        }
    }
}
