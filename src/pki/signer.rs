//! Signing certification requests into leaf certificates.

use rcgen::{CertificateSigningRequestParams, Issuer, KeyPair};
use tracing::debug;
use x509_parser::certification_request::X509CertificationRequest;
use x509_parser::prelude::FromDer;

use super::certificate::IssuedCertificate;
use super::extensions::{AltName, AuthorityKeyId, ExtensionList};
use super::inspect::first_str;
use super::keys::{KeyId, Serial, Validity};
use super::profile::{IssuerProfile, Role};
use super::request::CertificationRequest;
use crate::{Error, Result};

/// Issue a leaf certificate for `role` from `request`, signed by
/// `issuer_keys` on behalf of `issuer_cert`.
///
/// Subject and public key are taken from the request unchanged. Requests are
/// trusted: they only ever come from
/// [`build_request`](super::request::build_request) in the same process, and
/// the signer applies no policy of its own to them.
///
/// # Errors
///
/// Returns `Error::MissingExtension` if `issuer_cert` has no subject key
/// identifier, `Error::Config` if the requested common name is not a valid
/// host, or `Error::Certificate` if the request cannot be read or the
/// certificate cannot be signed.
pub fn sign(
    profile: &IssuerProfile,
    request: &CertificationRequest,
    issuer_cert: &IssuedCertificate,
    issuer_keys: &KeyPair,
    role: Role,
) -> Result<IssuedCertificate> {
    let authority = authority_key_id(issuer_cert)?;
    let (leaf_key_id, host) = request_identity(request)?;
    let alt_name = AltName::for_host(&host)?;

    let mut csr = CertificateSigningRequestParams::from_der(request.der())
        .map_err(|e| Error::Certificate(format!("Failed to read {role} request: {e}")))?;

    let serial = Serial::random();
    csr.params.serial_number = Some((&serial).into());
    Validity::years_from_now(profile.leaf_validity_years)?.apply(&mut csr.params);
    ExtensionList::leaf(leaf_key_id, authority, role, alt_name).apply(&mut csr.params);

    let issuer = Issuer::from_ca_cert_der(issuer_cert.der(), issuer_keys)
        .map_err(|e| Error::Certificate(format!("Failed to load issuer certificate: {e}")))?;
    let cert = csr
        .signed_by(&issuer)
        .map_err(|e| Error::Certificate(format!("Signing {role} certificate failed: {e}")))?;
    let issued = IssuedCertificate::from_rcgen(&cert)?;

    debug!(
        holder = %role,
        serial = %serial,
        issuer = %issuer_cert.label(),
        host = %host,
        "Leaf certificate issued"
    );
    Ok(issued)
}

/// Authority key identifier for certificates issued by `issuer_cert`.
fn authority_key_id(issuer_cert: &IssuedCertificate) -> Result<AuthorityKeyId> {
    let summary = issuer_cert.summary();
    let key_id = summary
        .subject_key_id
        .clone()
        .ok_or_else(|| Error::MissingExtension {
            extension: "subjectKeyIdentifier",
            certificate: issuer_cert.label(),
        })?;
    Ok(AuthorityKeyId {
        key_id,
        issuer_name: summary.subject_der.clone(),
        serial: summary.serial.clone(),
    })
}

/// Key identifier of the requested public key and the subject common name.
fn request_identity(request: &CertificationRequest) -> Result<(KeyId, String)> {
    let (_, csr) = X509CertificationRequest::from_der(request.der())
        .map_err(|e| Error::Certificate(format!("Failed to parse request: {e}")))?;
    let info = &csr.certification_request_info;
    let host = first_str(info.subject.iter_common_name())
        .ok_or_else(|| Error::Certificate("Request subject has no common name".to_string()))?;
    Ok((KeyId::derive(info.subject_pki.raw), host))
}
