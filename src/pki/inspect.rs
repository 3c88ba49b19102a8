//! Read issued certificates back into plain Rust values.
//!
//! Parses a DER certificate with `x509-parser` and extracts the fields the
//! issuance invariants are stated in: names, serial, validity, key
//! identifiers, constraints, usages and alternative names.

use std::net::IpAddr;

use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::prelude::FromDer;
use x509_parser::public_key::PublicKey;
use x509_parser::x509::AttributeTypeAndValue;

use super::extensions::AltName;
use super::keys::{KeyId, Serial};
use crate::{Error, Result};

/// Authority key identifier as read from a certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityKeyIdView {
    /// `keyIdentifier`
    pub key_id: Option<KeyId>,
    /// Whether `authorityCertIssuer` is present.
    pub has_issuer: bool,
    /// `authorityCertSerialNumber`
    pub serial: Option<Serial>,
}

/// Parsed view of one certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSummary {
    /// Serial number bytes as encoded.
    pub serial: Serial,
    /// DER encoding of the subject name.
    pub subject_der: Vec<u8>,
    /// DER encoding of the issuer name.
    pub issuer_der: Vec<u8>,
    /// Subject CN.
    pub common_name: Option<String>,
    /// Subject OU.
    pub organizational_unit: Option<String>,
    /// Issuer CN.
    pub issuer_common_name: Option<String>,
    /// `notBefore` as a Unix timestamp.
    pub not_before: i64,
    /// `notAfter` as a Unix timestamp.
    pub not_after: i64,
    /// DER `SubjectPublicKeyInfo`.
    pub public_key_der: Vec<u8>,
    /// Modulus size in bits for RSA keys, 0 otherwise.
    pub public_key_bits: usize,
    /// `subjectKeyIdentifier`
    pub subject_key_id: Option<KeyId>,
    /// `authorityKeyIdentifier`
    pub authority_key_id: Option<AuthorityKeyIdView>,
    /// `basicConstraints.cA`, `None` when the extension is absent.
    pub is_ca: Option<bool>,
    /// `keyUsage` digitalSignature / keyEncipherment.
    pub key_usage: Option<(bool, bool)>,
    /// `id-kp-serverAuth` present.
    pub server_auth: bool,
    /// `id-kp-clientAuth` present.
    pub client_auth: bool,
    /// Number of purposes listed in `extendedKeyUsage`.
    pub extended_key_usage_count: usize,
    /// Subject alternative names (DNS and IP only).
    pub alt_names: Vec<AltName>,
    /// Extension OIDs in encoding order, dotted form.
    pub extension_oids: Vec<String>,
}

impl CertificateSummary {
    /// Parse a DER-encoded certificate.
    ///
    /// # Errors
    ///
    /// Returns `Error::Certificate` if the certificate cannot be parsed.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| Error::Certificate(format!("Failed to parse certificate: {e}")))?;

        let mut summary = Self {
            serial: Serial::from_bytes(cert.tbs_certificate.raw_serial()),
            subject_der: cert.subject().as_raw().to_vec(),
            issuer_der: cert.issuer().as_raw().to_vec(),
            common_name: first_str(cert.subject().iter_common_name()),
            organizational_unit: first_str(cert.subject().iter_organizational_unit()),
            issuer_common_name: first_str(cert.issuer().iter_common_name()),
            not_before: cert.validity().not_before.timestamp(),
            not_after: cert.validity().not_after.timestamp(),
            public_key_der: cert.public_key().raw.to_vec(),
            public_key_bits: rsa_bits(&cert),
            subject_key_id: None,
            authority_key_id: None,
            is_ca: None,
            key_usage: None,
            server_auth: false,
            client_auth: false,
            extended_key_usage_count: 0,
            alt_names: Vec::new(),
            extension_oids: Vec::new(),
        };

        for ext in cert.extensions() {
            summary.extension_oids.push(ext.oid.to_id_string());
            match ext.parsed_extension() {
                ParsedExtension::SubjectKeyIdentifier(id) => {
                    summary.subject_key_id = Some(KeyId::from_bytes(id.0));
                }
                ParsedExtension::AuthorityKeyIdentifier(aki) => {
                    summary.authority_key_id = Some(AuthorityKeyIdView {
                        key_id: aki.key_identifier.as_ref().map(|id| KeyId::from_bytes(id.0)),
                        has_issuer: aki.authority_cert_issuer.is_some(),
                        serial: aki.authority_cert_serial.map(Serial::from_bytes),
                    });
                }
                ParsedExtension::BasicConstraints(bc) => summary.is_ca = Some(bc.ca),
                ParsedExtension::KeyUsage(ku) => {
                    summary.key_usage = Some((ku.digital_signature(), ku.key_encipherment()));
                }
                ParsedExtension::ExtendedKeyUsage(eku) => {
                    summary.server_auth = eku.server_auth;
                    summary.client_auth = eku.client_auth;
                    summary.extended_key_usage_count = eku_count(eku);
                }
                ParsedExtension::SubjectAlternativeName(san) => {
                    summary.alt_names = san.general_names.iter().filter_map(alt_name).collect();
                }
                _ => {}
            }
        }

        Ok(summary)
    }

    /// Whether subject and issuer names are byte-identical.
    #[must_use]
    pub fn is_self_issued(&self) -> bool {
        self.subject_der == self.issuer_der
    }

    /// Validity span in seconds.
    #[must_use]
    pub fn validity_seconds(&self) -> i64 {
        self.not_after - self.not_before
    }
}

pub(crate) fn first_str<'a, 'b, I>(mut attrs: I) -> Option<String>
where
    'b: 'a,
    I: Iterator<Item = &'a AttributeTypeAndValue<'b>>,
{
    attrs
        .next()
        .and_then(|attr| attr.as_str().ok())
        .map(str::to_owned)
}

fn rsa_bits(cert: &X509Certificate<'_>) -> usize {
    match cert.public_key().parsed() {
        Ok(PublicKey::RSA(rsa)) => rsa.key_size(),
        _ => 0,
    }
}

fn eku_count(eku: &x509_parser::extensions::ExtendedKeyUsage<'_>) -> usize {
    [
        eku.any,
        eku.server_auth,
        eku.client_auth,
        eku.code_signing,
        eku.email_protection,
        eku.time_stamping,
        eku.ocsp_signing,
    ]
    .into_iter()
    .filter(|set| *set)
    .count()
        + eku.other.len()
}

fn alt_name(name: &GeneralName<'_>) -> Option<AltName> {
    match name {
        GeneralName::DNSName(dns) => Some(AltName::Dns((*dns).to_owned())),
        GeneralName::IPAddress(bytes) => match bytes.len() {
            4 => <[u8; 4]>::try_from(*bytes).ok().map(|b| AltName::Ip(IpAddr::from(b))),
            16 => <[u8; 16]>::try_from(*bytes).ok().map(|b| AltName::Ip(IpAddr::from(b))),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::{CertificateParams, DnType, KeyPair, SanType};

    fn plain_cert(cn: &str, sans: Vec<SanType>) -> Vec<u8> {
        let mut params = CertificateParams::default();
        params.distinguished_name.push(DnType::CommonName, cn);
        params.subject_alt_names = sans;
        let key = KeyPair::generate().unwrap();
        params.self_signed(&key).unwrap().der().to_vec()
    }

    #[test]
    fn summary_reads_common_name_and_sans() {
        let der = plain_cert(
            "edge",
            vec![
                SanType::IpAddress("10.0.0.1".parse().unwrap()),
                SanType::DnsName("edge.local".try_into().unwrap()),
            ],
        );
        let summary = CertificateSummary::from_der(&der).unwrap();

        assert_eq!(summary.common_name.as_deref(), Some("edge"));
        assert!(summary.is_self_issued());
        assert_eq!(
            summary.alt_names,
            vec![
                AltName::Ip("10.0.0.1".parse().unwrap()),
                AltName::Dns("edge.local".to_string()),
            ]
        );
    }

    #[test]
    fn summary_reports_absent_extensions_as_none() {
        let der = plain_cert("bare", Vec::new());
        let summary = CertificateSummary::from_der(&der).unwrap();

        assert_eq!(summary.subject_key_id, None);
        assert_eq!(summary.authority_key_id, None);
        assert_eq!(summary.is_ca, None);
        assert!(!summary.server_auth && !summary.client_auth);
    }

    #[test]
    fn summary_rejects_garbage() {
        assert!(CertificateSummary::from_der(b"not a certificate").is_err());
    }
}
