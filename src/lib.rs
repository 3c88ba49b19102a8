//! PKI Issuer Library
//!
//! One-shot private certificate hierarchy: an RSA-2048 root certificate
//! authority and two leaf certificates for a single host, one for TLS server
//! authentication and one for TLS client authentication.
//!
//! # Features
//!
//! - **Typed extensions**: ordered `ExtensionRecord` lists, AKI linked to the
//!   issuer's parsed SKI, name and serial
//! - **HTTP trigger**: `GET /generate` returns all PEM material as JSON
//! - **Persistence**: `<dir>/<holder>/<holder>.cert.pem` and `.key`
//! - **Verification**: chains checked with rustls' WebPKI verifiers
//!
//! # Example
//!
//! ```no_run
//! use pki_issuer::pki::{IssuerProfile, Role, issue_hierarchy, verify_leaf};
//!
//! # fn main() -> pki_issuer::Result<()> {
//! let issuance = issue_hierarchy(&IssuerProfile::default(), "1.2.3.4")?;
//! verify_leaf(
//!     &issuance.root.certificate,
//!     &issuance.server.certificate,
//!     Role::Server,
//!     "1.2.3.4",
//! )?;
//! println!("{}", issuance.server.pem.cert_pem);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod pki;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
///
/// `RUST_LOG` overrides `level` when set.
///
/// # Errors
///
/// Returns `Error::Internal` if a global subscriber is already installed.
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => subscriber.with(fmt::layer().json()).try_init(),
        _ => subscriber.with(fmt::layer()).try_init(),
    }
    .map_err(|e| Error::Internal(format!("Failed to install tracing subscriber: {e}")))
}
