//! Issued certificates and their PEM renderings.

use rcgen::KeyPair;
use rustls::pki_types::CertificateDer;
use rustls::pki_types::pem::PemObject;
use serde::{Deserialize, Serialize};

use super::inspect::CertificateSummary;
use super::keys::Serial;
use super::profile::Holder;
use crate::{Error, Result};

/// A signed certificate in DER and PEM form, with its parsed fields.
#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    der: CertificateDer<'static>,
    pem: String,
    summary: CertificateSummary,
}

impl IssuedCertificate {
    /// Wrap a certificate freshly produced by rcgen.
    ///
    /// # Errors
    ///
    /// Returns `Error::Certificate` if the encoding cannot be parsed back.
    pub fn from_rcgen(cert: &rcgen::Certificate) -> Result<Self> {
        let summary = CertificateSummary::from_der(cert.der())?;
        Ok(Self {
            der: cert.der().clone(),
            pem: cert.pem(),
            summary,
        })
    }

    /// Load the first `CERTIFICATE` block from PEM text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Certificate` if no certificate block is present or it
    /// does not parse.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let der = CertificateDer::from_pem_slice(pem.as_bytes())
            .map_err(|e| Error::Certificate(format!("No certificate in PEM input: {e}")))?;
        let summary = CertificateSummary::from_der(&der)?;
        Ok(Self {
            der,
            pem: pem.to_string(),
            summary,
        })
    }

    /// DER encoding.
    #[must_use]
    pub fn der(&self) -> &CertificateDer<'static> {
        &self.der
    }

    /// PEM `CERTIFICATE` block.
    #[must_use]
    pub fn pem(&self) -> &str {
        &self.pem
    }

    /// Parsed fields.
    #[must_use]
    pub fn summary(&self) -> &CertificateSummary {
        &self.summary
    }

    /// Serial number.
    #[must_use]
    pub fn serial(&self) -> &Serial {
        &self.summary.serial
    }

    /// Label for logs and errors: the subject CN, or the serial when the
    /// subject has none.
    #[must_use]
    pub fn label(&self) -> String {
        self.summary
            .common_name
            .clone()
            .unwrap_or_else(|| self.summary.serial.to_hex())
    }
}

/// PEM material handed back to the caller for one holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PemBundle {
    /// `CERTIFICATE` block.
    #[serde(rename = "certPEM")]
    pub cert_pem: String,
    /// PKCS#8 `PRIVATE KEY` block.
    #[serde(rename = "privateKeyPEM")]
    pub private_key_pem: String,
    /// SPKI `PUBLIC KEY` block.
    #[serde(rename = "publicKeyPEM")]
    pub public_key_pem: String,
}

impl PemBundle {
    /// Render a certificate and the key pair it was issued for.
    #[must_use]
    pub fn new(certificate: &IssuedCertificate, key: &KeyPair) -> Self {
        Self {
            cert_pem: certificate.pem().to_string(),
            private_key_pem: key.serialize_pem(),
            public_key_pem: key.public_key_pem(),
        }
    }
}

/// Everything issued for one holder.
#[derive(Debug, Clone)]
pub struct IssuedMaterial {
    /// Who the material belongs to.
    pub holder: Holder,
    /// The signed certificate.
    pub certificate: IssuedCertificate,
    /// PEM rendering of certificate and keys.
    pub pem: PemBundle,
}

impl IssuedMaterial {
    /// Bundle a certificate with its key pair.
    #[must_use]
    pub fn new(holder: Holder, certificate: IssuedCertificate, key: &KeyPair) -> Self {
        let pem = PemBundle::new(&certificate, key);
        Self {
            holder,
            certificate,
            pem,
        }
    }
}
