//! Error handling and custom error types
//!
//! Every failure the relay can surface to a caller is one of these variants;
//! [`crate::relay`] maps each of them to a status code and JSON body.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Request body rejected (status {status}): {message}")]
    BodyRejected { status: u16, message: String },

    #[error("Invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Server configuration error: {0} is not set.")]
    MissingCredential(&'static str),

    #[error("Gemini API error (status {status}): {body}")]
    Upstream {
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("No content returned by Gemini API: {0}")]
    NoResult(String),

    #[error("Failed to parse Gemini response: {0}")]
    MalformedResponse(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
