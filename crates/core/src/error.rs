use thiserror::Error;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("Invalid journal file name: {0}")]
    InvalidJournalName(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, JournalError>;
