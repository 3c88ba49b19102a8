//! Certification requests for leaf certificates.

use rcgen::{CertificateParams, DistinguishedName, KeyPair};
use rustls::pki_types::CertificateSigningRequestDer;
use tracing::debug;

use super::extensions::AltName;
use super::keys::generate_key_pair;
use super::profile::{IssuerProfile, Role};
use crate::{Error, Result};

/// A self-signed PKCS#10 request, consumed by the signer right after it is
/// built.
#[derive(Debug, Clone)]
pub struct CertificationRequest {
    /// Requested subject.
    pub subject: DistinguishedName,
    /// Host identity the request was built for.
    pub common_name: String,
    der: CertificateSigningRequestDer<'static>,
}

impl CertificationRequest {
    /// DER encoding.
    #[must_use]
    pub fn der(&self) -> &CertificateSigningRequestDer<'static> {
        &self.der
    }
}

/// Generate a fresh key pair and a request for `role` naming `common_name`.
///
/// # Errors
///
/// Returns `Error::Config` for an empty common name or one that is neither an
/// IP literal nor an ASCII DNS name, `Error::KeyGeneration`
/// if no key can be produced, or `Error::Certificate` if signing the request
/// fails.
pub fn build_request(
    profile: &IssuerProfile,
    role: Role,
    common_name: &str,
) -> Result<(CertificationRequest, KeyPair)> {
    let common_name = common_name.trim();
    if common_name.is_empty() {
        return Err(Error::Config("Common name must not be empty".to_string()));
    }
    AltName::for_host(common_name)?;

    let key = generate_key_pair()?;
    let mut params = CertificateParams::default();
    params.distinguished_name = profile.leaf_name(role, common_name);

    let csr = params
        .serialize_request(&key)
        .map_err(|e| Error::Certificate(format!("Signing {role} request failed: {e}")))?;

    debug!(role = %role, common_name, "Certification request built");
    Ok((
        CertificationRequest {
            subject: params.distinguished_name,
            common_name: common_name.to_string(),
            der: csr.der().clone(),
        },
        key,
    ))
}
