//! Private certificate hierarchy issuance.
//!
//! # Architecture
//!
//! ```text
//! issue_root ───────────────┐  (RSA-2048 key, self-signed, cA)
//!                           │
//! build_request(Server) ──► sign ──► server leaf (serverAuth, 40y)
//! build_request(Client) ──► sign ──► client leaf (clientAuth, 40y)
//! ```
//!
//! Each leaf shares nothing with its sibling except the root. A leaf's
//! authority key identifier is built from the root's parsed subject key
//! identifier, subject name and serial, so chain linkage holds by
//! construction.
//!
//! # Modules
//!
//! - [`profile`]: organisational identity, role to OU mapping, validity policy
//! - [`keys`]: RSA key generation, serials, key identifiers, validity windows
//! - [`extensions`]: ordered, typed extension records and their DER encoding
//! - [`root`] / [`request`] / [`signer`]: the three issuance stages
//! - [`pipeline`]: [`issue_hierarchy`], all or nothing
//! - [`store`]: on-disk PEM layout
//! - [`inspect`] / [`verify`]: read certificates back and verify chains

pub mod certificate;
pub mod extensions;
pub mod inspect;
pub mod keys;
pub mod pipeline;
pub mod profile;
pub mod request;
pub mod root;
pub mod signer;
pub mod store;
pub mod verify;

pub use certificate::{IssuedCertificate, IssuedMaterial, PemBundle};
pub use extensions::{AltName, AuthorityKeyId, ExtensionList, ExtensionRecord, KeyUsage};
pub use inspect::{AuthorityKeyIdView, CertificateSummary};
pub use keys::{KeyId, Serial, Validity};
pub use pipeline::{Issuance, issue_hierarchy};
pub use profile::{Holder, IssuerProfile, Role, RoleUnits};
pub use request::{CertificationRequest, build_request};
pub use root::issue_root;
pub use signer::sign;
pub use store::{load_certificate, persist_issuance};
pub use verify::verify_leaf;
