//! Error type shared by every stage of a run.
//!
//! Soft outcomes (outside the posting window, nothing new to post) are not
//! errors; they are reported through [`crate::pipeline::RunOutcome`]. Anything
//! that ends up here aborts the run.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authorization error: {0}")]
    Auth(String),
}

pub type Result<T> = std::result::Result<T, Error>;
