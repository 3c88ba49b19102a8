//! One-shot issuance of a root and its two leaves.

use rcgen::KeyPair;
use tracing::info;

use super::certificate::{IssuedCertificate, IssuedMaterial};
use super::profile::{Holder, IssuerProfile, Role};
use super::request::build_request;
use super::root::issue_root;
use super::signer::sign;
use crate::Result;

/// A complete hierarchy: the root and one leaf per role.
#[derive(Debug, Clone)]
pub struct Issuance {
    /// Root certificate authority.
    pub root: IssuedMaterial,
    /// Server-auth leaf.
    pub server: IssuedMaterial,
    /// Client-auth leaf.
    pub client: IssuedMaterial,
}

impl Issuance {
    /// Leaf material for `role`.
    #[must_use]
    pub fn leaf(&self, role: Role) -> &IssuedMaterial {
        match role {
            Role::Server => &self.server,
            Role::Client => &self.client,
        }
    }

    /// Root, server and client material, in that order.
    pub fn iter(&self) -> impl Iterator<Item = &IssuedMaterial> {
        [&self.root, &self.server, &self.client].into_iter()
    }
}

/// Issue a root, then a server leaf and a client leaf for `common_name`.
///
/// Either the whole hierarchy is returned or nothing is.
///
/// # Errors
///
/// Returns the first error raised by profile validation, key generation,
/// request building or signing.
pub fn issue_hierarchy(profile: &IssuerProfile, common_name: &str) -> Result<Issuance> {
    profile.validate()?;

    let (root_cert, root_key) = issue_root(profile)?;
    let server = issue_leaf(profile, &root_cert, &root_key, Role::Server, common_name)?;
    let client = issue_leaf(profile, &root_cert, &root_key, Role::Client, common_name)?;
    let root = IssuedMaterial::new(Holder::Ca, root_cert, &root_key);

    info!(
        common_name,
        root_serial = %root.certificate.serial(),
        server_serial = %server.certificate.serial(),
        client_serial = %client.certificate.serial(),
        "Certificate hierarchy issued"
    );

    Ok(Issuance {
        root,
        server,
        client,
    })
}

fn issue_leaf(
    profile: &IssuerProfile,
    root_cert: &IssuedCertificate,
    root_key: &KeyPair,
    role: Role,
    common_name: &str,
) -> Result<IssuedMaterial> {
    let (request, key) = build_request(profile, role, common_name)?;
    let certificate = sign(profile, &request, root_cert, root_key, role)?;
    Ok(IssuedMaterial::new(Holder::Leaf(role), certificate, &key))
}
