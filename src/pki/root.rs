//! Self-signed root certificate authority.

use rcgen::{CertificateParams, KeyPair, PublicKeyData};
use tracing::debug;

use super::certificate::IssuedCertificate;
use super::extensions::ExtensionList;
use super::inspect::CertificateSummary;
use super::keys::{KeyId, Serial, Validity, generate_key_pair};
use super::profile::{Holder, IssuerProfile};
use crate::{Error, Result};

/// Generate the root key pair and its self-signed certificate.
///
/// The certificate carries, in order, a subject key identifier, an authority
/// key identifier pointing at itself (own key identifier, own subject name,
/// own serial) and `basicConstraints { cA: true }`.
///
/// # Errors
///
/// Returns `Error::KeyGeneration` if no key can be produced, or
/// `Error::Certificate` if signing fails.
pub fn issue_root(profile: &IssuerProfile) -> Result<(IssuedCertificate, KeyPair)> {
    let key = generate_key_pair()?;
    let serial = Serial::random();

    let mut params = CertificateParams::default();
    params.distinguished_name = profile.root_name();
    params.serial_number = Some((&serial).into());
    Validity::years_from_now(profile.root_validity_years)?.apply(&mut params);

    let own_name = encoded_subject(&params, &key)?;
    let key_id = KeyId::derive(&key.subject_public_key_info());
    ExtensionList::root(key_id, own_name, serial.clone()).apply(&mut params);

    let cert = params
        .self_signed(&key)
        .map_err(|e| Error::Certificate(format!("Root certificate signing failed: {e}")))?;
    let issued = IssuedCertificate::from_rcgen(&cert)?;

    debug!(holder = %Holder::Ca, serial = %serial, "Root certificate issued");
    Ok((issued, key))
}

/// DER `Name` exactly as rcgen will write it into the final certificate.
///
/// The self-referential authority key identifier needs the subject name
/// before the certificate exists, so an extension-less draft is signed and
/// its subject read back.
fn encoded_subject(params: &CertificateParams, key: &KeyPair) -> Result<Vec<u8>> {
    let draft = params
        .self_signed(key)
        .map_err(|e| Error::Certificate(format!("Root name encoding failed: {e}")))?;
    Ok(CertificateSummary::from_der(draft.der())?.subject_der)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pki::keys::RSA_KEY_BITS;

    #[test]
    fn root_is_self_issued_ca() {
        // GIVEN: the default profile
        let profile = IssuerProfile::default();
        // WHEN: issuing the root
        let (root, key) = issue_root(&profile).unwrap();
        let summary = root.summary();
        // THEN: self-issued, cA set, key matches
        assert!(summary.is_self_issued());
        assert_eq!(summary.is_ca, Some(true));
        assert_eq!(summary.public_key_der, key.subject_public_key_info());
        assert_eq!(summary.public_key_bits, RSA_KEY_BITS);
        assert_eq!(summary.common_name.as_deref(), Some("Digi Cert"));
    }

    #[test]
    fn root_authority_key_id_points_at_itself() {
        let (root, _) = issue_root(&IssuerProfile::default()).unwrap();
        let summary = root.summary();
        let aki = summary.authority_key_id.clone().unwrap();

        assert_eq!(aki.key_id, summary.subject_key_id);
        assert_eq!(aki.serial.as_ref(), Some(&summary.serial));
        assert!(aki.has_issuer);
    }

    #[test]
    fn root_extensions_are_ordered() {
        let (root, _) = issue_root(&IssuerProfile::default()).unwrap();
        assert_eq!(
            root.summary().extension_oids,
            ["2.5.29.14", "2.5.29.35", "2.5.29.19"]
        );
    }

    #[test]
    fn root_validity_follows_profile() {
        let profile = IssuerProfile {
            root_validity_years: 2,
            ..IssuerProfile::default()
        };
        let (root, _) = issue_root(&profile).unwrap();
        let days = root.summary().validity_seconds() / 86_400;
        assert!((730..=731).contains(&days), "got {days} days");
    }
}
