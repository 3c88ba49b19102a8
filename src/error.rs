//! Error types for the PKI issuer

use std::io;
use std::path::PathBuf;

use axum::http::StatusCode;
use thiserror::Error;

/// Result type alias for the PKI issuer
pub type Result<T> = std::result::Result<T, Error>;

/// PKI issuer errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Asymmetric key pair generation failed (entropy or parameter failure)
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    /// The issuer certificate lacks an extension required to sign a leaf
    #[error("Issuer certificate '{certificate}' has no {extension} extension")]
    MissingExtension {
        /// Extension name (e.g. `subjectKeyIdentifier`)
        extension: &'static str,
        /// Common name (or serial) of the certificate that lacks it
        certificate: String,
    },

    /// Certificate or request encoding/parsing error
    #[error("Certificate error: {0}")]
    Certificate(String),

    /// Writing issued PEM material to disk failed
    #[error("Cannot write '{}': {source}", path.display())]
    Persistence {
        /// File or directory being written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Chain verification failed
    #[error("Verification failed: {0}")]
    Verification(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map to the HTTP status returned by the issuance endpoint
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Config(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the error aborts an issuance (everything except persistence)
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Persistence { .. })
    }
}
