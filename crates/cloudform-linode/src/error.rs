//! Linode provider error types

use thiserror::Error;

/// Errors raised while configuring the Linode client.
///
/// Failures of individual API calls are reported as
/// [`cloudform_core::RemoteError`] instead.
#[derive(Error, Debug)]
pub enum LinodeError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, LinodeError>;
