use inquire::InquireError;
use thiserror::Error;

/// Exit status used when the user interrupts the program
pub const EXIT_INTERRUPTED: u8 = 130;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Required tool not found: {tool}")]
    MissingTool { tool: String, hint: String },

    #[error("Playlist URL cannot be empty")]
    EmptyUrl,

    #[error("Interrupted by user")]
    Interrupted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl AppError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Interrupted => EXIT_INTERRUPTED,
            _ => 1,
        }
    }
}

impl From<InquireError> for AppError {
    fn from(e: InquireError) -> Self {
        match e {
            InquireError::OperationInterrupted | InquireError::OperationCanceled => {
                Self::Interrupted
            }
            InquireError::IO(io) => Self::Io(io),
            other => Self::Prompt(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
