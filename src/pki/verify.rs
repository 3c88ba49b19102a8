//! Chain verification with rustls' WebPKI verifiers.

use std::sync::Arc;

use rustls::RootCertStore;
use rustls::client::WebPkiServerVerifier;
use rustls::client::danger::ServerCertVerifier;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{ServerName, UnixTime};
use rustls::server::WebPkiClientVerifier;
use tracing::debug;

use super::certificate::IssuedCertificate;
use super::profile::Role;
use crate::{Error, Result};

/// Verify that `leaf` chains to `root` and is valid for `role` now.
///
/// Server leaves are also checked against `host` (DNS name or IP literal).
///
/// # Errors
///
/// Returns `Error::Verification` if the root cannot serve as a trust anchor,
/// `host` is not a valid server name, or the chain is rejected.
pub fn verify_leaf(
    root: &IssuedCertificate,
    leaf: &IssuedCertificate,
    role: Role,
    host: &str,
) -> Result<()> {
    let mut roots = RootCertStore::empty();
    roots
        .add(root.der().clone())
        .map_err(|e| Error::Verification(format!("Root rejected as trust anchor: {e}")))?;
    let roots = Arc::new(roots);
    let provider = provider();
    let now = UnixTime::now();

    match role {
        Role::Server => {
            let server_name = ServerName::try_from(host)
                .map_err(|e| Error::Verification(format!("Invalid server name '{host}': {e}")))?;
            let verifier = WebPkiServerVerifier::builder_with_provider(roots, provider)
                .build()
                .map_err(|e| Error::Verification(format!("Failed to build server verifier: {e}")))?;
            verifier
                .verify_server_cert(leaf.der(), &[], &server_name, &[], now)
                .map_err(|e| Error::Verification(format!("Server certificate rejected: {e}")))?;
        }
        Role::Client => {
            let verifier = WebPkiClientVerifier::builder_with_provider(roots, provider)
                .build()
                .map_err(|e| Error::Verification(format!("Failed to build client verifier: {e}")))?;
            verifier
                .verify_client_cert(leaf.der(), &[], now)
                .map_err(|e| Error::Verification(format!("Client certificate rejected: {e}")))?;
        }
    }

    debug!(role = %role, leaf = %leaf.label(), root = %root.label(), "Chain verified");
    Ok(())
}

fn provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::aws_lc_rs::default_provider())
}
