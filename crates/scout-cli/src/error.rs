use scout_core::DispatchError;
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] scout_core::ValidationError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Store(#[from] scout_core::StoreError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Command(_) => 2,
            Self::Dispatch(DispatchError::Configuration) => 3,
            Self::Dispatch(DispatchError::Cancelled | DispatchError::DeadlineExceeded { .. }) => 5,
            Self::Dispatch(_) => 4,
            Self::Serialization(_) => 6,
            Self::Store(_) => 7,
            Self::Io(_) => 10,
        }
    }
}
