//! Certificate extensions as an ordered list of typed records.
//!
//! rcgen writes its built-in extensions in a fixed internal order and has no
//! field for an authority key identifier carrying issuer name and serial.
//! Every extension is therefore encoded here and handed to rcgen as a
//! [`CustomExtension`], in exactly the order the list was built.

use std::fmt;
use std::net::IpAddr;

use rcgen::CustomExtension;
use rustls::pki_types::DnsName;
use yasna::models::ObjectIdentifier;
use yasna::{DERWriter, Tag};

use super::keys::{KeyId, Serial};
use super::profile::Role;
use crate::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// OIDs
// ─────────────────────────────────────────────────────────────────────────────

/// `id-ce-subjectKeyIdentifier`
pub const OID_SUBJECT_KEY_IDENTIFIER: &[u64] = &[2, 5, 29, 14];
/// `id-ce-keyUsage`
pub const OID_KEY_USAGE: &[u64] = &[2, 5, 29, 15];
/// `id-ce-subjectAltName`
pub const OID_SUBJECT_ALT_NAME: &[u64] = &[2, 5, 29, 17];
/// `id-ce-basicConstraints`
pub const OID_BASIC_CONSTRAINTS: &[u64] = &[2, 5, 29, 19];
/// `id-ce-authorityKeyIdentifier`
pub const OID_AUTHORITY_KEY_IDENTIFIER: &[u64] = &[2, 5, 29, 35];
/// `id-ce-extKeyUsage`
pub const OID_EXT_KEY_USAGE: &[u64] = &[2, 5, 29, 37];
/// `id-kp-serverAuth`
pub const OID_KP_SERVER_AUTH: &[u64] = &[1, 3, 6, 1, 5, 5, 7, 3, 1];
/// `id-kp-clientAuth`
pub const OID_KP_CLIENT_AUTH: &[u64] = &[1, 3, 6, 1, 5, 5, 7, 3, 2];

// GeneralName CHOICE tags
const TAG_DNS_NAME: u64 = 2;
const TAG_DIRECTORY_NAME: u64 = 4;
const TAG_IP_ADDRESS: u64 = 7;

// KeyUsage bits, numbered from the most significant bit of the first octet
const KU_DIGITAL_SIGNATURE: u8 = 0x80;
const KU_KEY_ENCIPHERMENT: u8 = 0x20;

// ─────────────────────────────────────────────────────────────────────────────
// Record types
// ─────────────────────────────────────────────────────────────────────────────

/// A single subject alternative name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AltName {
    /// `dNSName`
    Dns(String),
    /// `iPAddress`
    Ip(IpAddr),
}

impl AltName {
    /// IP literal when `name` parses as one, DNS name otherwise.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `name` is neither an IP literal nor a valid
    /// ASCII DNS name. `dNSName` is an IA5String, so internationalised names
    /// must be given in their `xn--` form.
    pub fn for_host(name: &str) -> Result<Self> {
        if let Ok(ip) = name.parse::<IpAddr>() {
            return Ok(Self::Ip(ip));
        }
        DnsName::try_from(name)
            .map(|dns| Self::Dns(dns.as_ref().to_string()))
            .map_err(|e| Error::Config(format!("Invalid host name '{name}': {e}")))
    }
}

impl fmt::Display for AltName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dns(name) => write!(f, "DNS:{name}"),
            Self::Ip(ip) => write!(f, "IP:{ip}"),
        }
    }
}

/// Authority key identifier: the issuer's key identifier plus its name and
/// serial (`authorityCertIssuer` and `authorityCertSerialNumber` are always
/// written together).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityKeyId {
    /// Issuer's subject key identifier.
    pub key_id: KeyId,
    /// DER encoding of the issuer's subject `Name`.
    pub issuer_name: Vec<u8>,
    /// Issuer certificate serial.
    pub serial: Serial,
}

/// Key usage bits carried by leaf certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage {
    /// `digitalSignature`
    pub digital_signature: bool,
    /// `keyEncipherment`
    pub key_encipherment: bool,
}

impl KeyUsage {
    /// `digitalSignature` + `keyEncipherment`, the usage of every leaf.
    pub const LEAF: KeyUsage = KeyUsage {
        digital_signature: true,
        key_encipherment: true,
    };
}

/// One certificate extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionRecord {
    /// `subjectKeyIdentifier`
    SubjectKeyIdentifier(KeyId),
    /// `authorityKeyIdentifier`
    AuthorityKeyIdentifier(AuthorityKeyId),
    /// `basicConstraints`
    BasicConstraints {
        /// `cA` flag.
        ca: bool,
    },
    /// `keyUsage`
    KeyUsage(KeyUsage),
    /// `extendedKeyUsage` restricted to a single role.
    ExtendedKeyUsage(Role),
    /// `subjectAltName` with a single entry.
    SubjectAltName(AltName),
}

impl ExtensionRecord {
    /// Conventional extension name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SubjectKeyIdentifier(_) => "subjectKeyIdentifier",
            Self::AuthorityKeyIdentifier(_) => "authorityKeyIdentifier",
            Self::BasicConstraints { .. } => "basicConstraints",
            Self::KeyUsage(_) => "keyUsage",
            Self::ExtendedKeyUsage(_) => "extKeyUsage",
            Self::SubjectAltName(_) => "subjectAltName",
        }
    }

    /// Extension OID arcs.
    #[must_use]
    pub fn oid(&self) -> &'static [u64] {
        match self {
            Self::SubjectKeyIdentifier(_) => OID_SUBJECT_KEY_IDENTIFIER,
            Self::AuthorityKeyIdentifier(_) => OID_AUTHORITY_KEY_IDENTIFIER,
            Self::BasicConstraints { .. } => OID_BASIC_CONSTRAINTS,
            Self::KeyUsage(_) => OID_KEY_USAGE,
            Self::ExtendedKeyUsage(_) => OID_EXT_KEY_USAGE,
            Self::SubjectAltName(_) => OID_SUBJECT_ALT_NAME,
        }
    }

    /// RFC 5280 criticality: basic constraints and key usage are critical.
    #[must_use]
    pub fn critical(&self) -> bool {
        matches!(self, Self::BasicConstraints { .. } | Self::KeyUsage(_))
    }

    /// DER encoding of the `extnValue` contents.
    #[must_use]
    pub fn to_der(&self) -> Vec<u8> {
        yasna::construct_der(|writer| self.write(writer))
    }

    /// Convert into an rcgen custom extension.
    #[must_use]
    pub fn to_custom_extension(&self) -> CustomExtension {
        let mut ext = CustomExtension::from_oid_content(self.oid(), self.to_der());
        ext.set_criticality(self.critical());
        ext
    }

    fn write(&self, writer: DERWriter<'_>) {
        match self {
            Self::SubjectKeyIdentifier(key_id) => writer.write_bytes(key_id.as_bytes()),
            Self::AuthorityKeyIdentifier(aki) => write_authority_key_id(writer, aki),
            Self::BasicConstraints { ca } => writer.write_sequence(|writer| {
                // cA DEFAULT FALSE is omitted when false
                if *ca {
                    writer.next().write_bool(true);
                }
            }),
            Self::KeyUsage(usage) => {
                let mut bits = 0u8;
                if usage.digital_signature {
                    bits |= KU_DIGITAL_SIGNATURE;
                }
                if usage.key_encipherment {
                    bits |= KU_KEY_ENCIPHERMENT;
                }
                let len = 8 - bits.trailing_zeros() as usize;
                writer.write_bitvec_bytes(&[bits], len);
            }
            Self::ExtendedKeyUsage(role) => writer.write_sequence(|writer| {
                let purpose = match role {
                    Role::Server => OID_KP_SERVER_AUTH,
                    Role::Client => OID_KP_CLIENT_AUTH,
                };
                writer
                    .next()
                    .write_oid(&ObjectIdentifier::from_slice(purpose));
            }),
            Self::SubjectAltName(name) => writer.write_sequence(|writer| {
                write_general_name(writer.next(), name);
            }),
        }
    }
}

fn write_authority_key_id(writer: DERWriter<'_>, aki: &AuthorityKeyId) {
    writer.write_sequence(|writer| {
        writer
            .next()
            .write_tagged_implicit(Tag::context(0), |writer| {
                writer.write_bytes(aki.key_id.as_bytes());
            });
        writer
            .next()
            .write_tagged_implicit(Tag::context(1), |writer| {
                writer.write_sequence(|writer| {
                    writer
                        .next()
                        .write_tagged(Tag::context(TAG_DIRECTORY_NAME), |writer| {
                            writer.write_der(&aki.issuer_name);
                        });
                });
            });
        writer
            .next()
            .write_tagged_implicit(Tag::context(2), |writer| {
                writer.write_bigint_bytes(aki.serial.as_bytes(), true);
            });
    });
}

fn write_general_name(writer: DERWriter<'_>, name: &AltName) {
    match name {
        AltName::Dns(dns) => {
            writer.write_tagged_implicit(Tag::context(TAG_DNS_NAME), |writer| {
                writer.write_ia5_string(dns);
            });
        }
        AltName::Ip(IpAddr::V4(v4)) => {
            writer.write_tagged_implicit(Tag::context(TAG_IP_ADDRESS), |writer| {
                writer.write_bytes(&v4.octets());
            });
        }
        AltName::Ip(IpAddr::V6(v6)) => {
            writer.write_tagged_implicit(Tag::context(TAG_IP_ADDRESS), |writer| {
                writer.write_bytes(&v6.octets());
            });
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Ordered list
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered extension list for one certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionList {
    records: Vec<ExtensionRecord>,
}

impl ExtensionList {
    /// Empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record.
    #[must_use]
    pub fn with(mut self, record: ExtensionRecord) -> Self {
        self.records.push(record);
        self
    }

    /// Extensions of a self-signed root: SKI, self-referential AKI, cA.
    #[must_use]
    pub fn root(key_id: KeyId, own_name: Vec<u8>, serial: Serial) -> Self {
        Self::new()
            .with(ExtensionRecord::SubjectKeyIdentifier(key_id.clone()))
            .with(ExtensionRecord::AuthorityKeyIdentifier(AuthorityKeyId {
                key_id,
                issuer_name: own_name,
                serial,
            }))
            .with(ExtensionRecord::BasicConstraints { ca: true })
    }

    /// Extensions of a leaf issued for `role`.
    #[must_use]
    pub fn leaf(key_id: KeyId, authority: AuthorityKeyId, role: Role, host: AltName) -> Self {
        Self::new()
            .with(ExtensionRecord::SubjectKeyIdentifier(key_id))
            .with(ExtensionRecord::AuthorityKeyIdentifier(authority))
            .with(ExtensionRecord::KeyUsage(KeyUsage::LEAF))
            .with(ExtensionRecord::BasicConstraints { ca: false })
            .with(ExtensionRecord::ExtendedKeyUsage(role))
            .with(ExtensionRecord::SubjectAltName(host))
    }

    /// Records in order.
    pub fn iter(&self) -> impl Iterator<Item = &ExtensionRecord> {
        self.records.iter()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The subject key identifier, if present.
    #[must_use]
    pub fn subject_key_id(&self) -> Option<&KeyId> {
        self.records.iter().find_map(|r| match r {
            ExtensionRecord::SubjectKeyIdentifier(id) => Some(id),
            _ => None,
        })
    }

    /// The authority key identifier, if present.
    #[must_use]
    pub fn authority_key_id(&self) -> Option<&AuthorityKeyId> {
        self.records.iter().find_map(|r| match r {
            ExtensionRecord::AuthorityKeyIdentifier(aki) => Some(aki),
            _ => None,
        })
    }

    /// Install the list into rcgen parameters, replacing rcgen's own
    /// extension handling.
    pub fn apply(&self, params: &mut rcgen::CertificateParams) {
        params.is_ca = rcgen::IsCa::NoCa;
        params.key_usages.clear();
        params.extended_key_usages.clear();
        params.subject_alt_names.clear();
        params.use_authority_key_identifier_extension = false;
        params.custom_extensions = self
            .records
            .iter()
            .map(ExtensionRecord::to_custom_extension)
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn alt_name_discriminates_ip_literals() {
        assert_eq!(
            AltName::for_host("1.2.3.4").unwrap(),
            AltName::Ip("1.2.3.4".parse().unwrap())
        );
        assert_eq!(
            AltName::for_host("::1").unwrap(),
            AltName::Ip("::1".parse().unwrap())
        );
        assert_eq!(
            AltName::for_host("gateway.example.com").unwrap(),
            AltName::Dns("gateway.example.com".to_string())
        );
    }

    #[test]
    fn alt_name_rejects_names_that_are_not_ia5_dns() {
        for name in ["bücher.example", "two words", "bad..dots", "-edge.local", ""] {
            let err = AltName::for_host(name).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{name}: {err}");
        }
        // punycode form of the same name is fine
        assert_eq!(
            AltName::for_host("xn--bcher-kva.example").unwrap(),
            AltName::Dns("xn--bcher-kva.example".to_string())
        );
    }

    #[test]
    fn key_usage_encodes_bits_zero_and_two() {
        let der = ExtensionRecord::KeyUsage(KeyUsage::LEAF).to_der();
        // BIT STRING, 2 bytes, 5 unused bits, 1010_0000
        assert_eq!(der, vec![0x03, 0x02, 0x05, 0xa0]);
    }

    #[test]
    fn basic_constraints_omits_default_false() {
        assert_eq!(
            ExtensionRecord::BasicConstraints { ca: false }.to_der(),
            vec![0x30, 0x00]
        );
        assert_eq!(
            ExtensionRecord::BasicConstraints { ca: true }.to_der(),
            vec![0x30, 0x03, 0x01, 0x01, 0xff]
        );
    }

    #[test]
    fn extended_key_usage_carries_one_purpose() {
        let server = ExtensionRecord::ExtendedKeyUsage(Role::Server).to_der();
        let client = ExtensionRecord::ExtendedKeyUsage(Role::Client).to_der();
        // SEQUENCE { OID 1.3.6.1.5.5.7.3.x }
        assert_eq!(server[..4], [0x30, 0x0a, 0x06, 0x08]);
        assert_eq!(server.last(), Some(&0x01));
        assert_eq!(client.last(), Some(&0x02));
    }

    #[test]
    fn ip_alt_name_uses_tag_seven() {
        let name = AltName::for_host("1.2.3.4").unwrap();
        let der = ExtensionRecord::SubjectAltName(name).to_der();
        assert_eq!(der, vec![0x30, 0x06, 0x87, 0x04, 1, 2, 3, 4]);
    }

    #[test]
    fn dns_alt_name_uses_tag_two() {
        let name = AltName::for_host("a.io").unwrap();
        let der = ExtensionRecord::SubjectAltName(name).to_der();
        assert_eq!(der, vec![0x30, 0x06, 0x82, 0x04, b'a', b'.', b'i', b'o']);
    }

    #[test]
    fn authority_key_id_writes_all_three_fields() {
        let aki = AuthorityKeyId {
            key_id: KeyId::from_bytes(&[0xaa; 20]),
            // empty Name: SEQUENCE {}
            issuer_name: vec![0x30, 0x00],
            serial: Serial::from_bytes(&[0x7f, 0x01]),
        };
        let der = ExtensionRecord::AuthorityKeyIdentifier(aki).to_der();

        let mut expected = vec![0x30, 0x20, 0x80, 0x14];
        expected.extend([0xaa; 20]);
        // [1] { [4] { SEQUENCE {} } }
        expected.extend([0xa1, 0x04, 0xa4, 0x02, 0x30, 0x00]);
        // [2] INTEGER
        expected.extend([0x82, 0x02, 0x7f, 0x01]);
        assert_eq!(der, expected);
    }

    #[test]
    fn leaf_list_is_ordered_and_linked() {
        let authority = AuthorityKeyId {
            key_id: KeyId::from_bytes(&[1; 20]),
            issuer_name: vec![0x30, 0x00],
            serial: Serial::from_bytes(&[1]),
        };
        let list = ExtensionList::leaf(
            KeyId::from_bytes(&[2; 20]),
            authority.clone(),
            Role::Client,
            AltName::Dns("host.local".to_string()),
        );

        let names: Vec<_> = list.iter().map(ExtensionRecord::name).collect();
        assert_eq!(
            names,
            [
                "subjectKeyIdentifier",
                "authorityKeyIdentifier",
                "keyUsage",
                "basicConstraints",
                "extKeyUsage",
                "subjectAltName",
            ]
        );
        assert_eq!(list.authority_key_id(), Some(&authority));
        assert_eq!(list.subject_key_id(), Some(&KeyId::from_bytes(&[2; 20])));
    }

    #[test]
    fn root_list_references_itself() {
        let id = KeyId::from_bytes(&[9; 20]);
        let list = ExtensionList::root(id.clone(), vec![0x30, 0x00], Serial::from_bytes(&[5]));
        assert_eq!(list.len(), 3);
        assert_eq!(list.authority_key_id().map(|a| &a.key_id), Some(&id));
        assert!(list
            .iter()
            .any(|r| *r == ExtensionRecord::BasicConstraints { ca: true }));
    }

    #[test]
    fn apply_replaces_rcgen_builtins() {
        let mut params = rcgen::CertificateParams::default();
        params.is_ca = rcgen::IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
        let list = ExtensionList::new().with(ExtensionRecord::BasicConstraints { ca: true });
        list.apply(&mut params);

        assert!(matches!(params.is_ca, rcgen::IsCa::NoCa));
        assert_eq!(params.custom_extensions.len(), 1);
        assert!(params.custom_extensions[0].criticality());
    }
}
