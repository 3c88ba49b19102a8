//! Issuer profile: the fixed organisational identity and validity policy.
//!
//! Distinguished name fields, the organisational unit for each role and the
//! validity in years are plain configuration data.
//!
//! # Example YAML
//!
//! ```yaml
//! profile:
//!   country: "India"
//!   state: "Surat"
//!   locality: "Nandanvan"
//!   organization: "Alpha"
//!   root_organizational_unit: "Digi Cert"
//!   root_common_name: "Digi Cert"
//!   units:
//!     server: "Alpha"
//!     client: "platform"
//!   root_validity_years: 1
//!   leaf_validity_years: 40
//! ```

use std::fmt;

use rcgen::{DistinguishedName, DnType};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Roles
// ─────────────────────────────────────────────────────────────────────────────

/// Purpose a leaf certificate is issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// TLS server authentication (`id-kp-serverAuth`).
    Server,
    /// TLS client authentication (`id-kp-clientAuth`).
    Client,
}

impl Role {
    /// Both leaf roles, in issuance order.
    pub const ALL: [Role; 2] = [Role::Server, Role::Client];

    /// Lowercase role name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Client => "client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Owner of a piece of issued material; names its directory and files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Holder {
    /// The root certificate authority.
    Ca,
    /// A leaf certificate.
    Leaf(Role),
}

impl Holder {
    /// All holders, in issuance order.
    pub const ALL: [Holder; 3] = [
        Holder::Ca,
        Holder::Leaf(Role::Server),
        Holder::Leaf(Role::Client),
    ];

    /// Directory and file stem for this holder (`ca`, `server`, `client`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ca => "ca",
            Self::Leaf(role) => role.as_str(),
        }
    }
}

impl fmt::Display for Holder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Profile
// ─────────────────────────────────────────────────────────────────────────────

/// Organisational unit assigned to each leaf role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleUnits {
    /// OU for server certificates.
    pub server: String,
    /// OU for client certificates.
    pub client: String,
}

impl Default for RoleUnits {
    fn default() -> Self {
        Self {
            server: "Alpha".to_string(),
            client: "platform".to_string(),
        }
    }
}

impl RoleUnits {
    /// OU for `role`.
    #[must_use]
    pub fn for_role(&self, role: Role) -> &str {
        match role {
            Role::Server => &self.server,
            Role::Client => &self.client,
        }
    }
}

/// Identity and validity policy shared by every certificate in a hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuerProfile {
    /// `countryName`
    pub country: String,
    /// `stateOrProvinceName`
    pub state: String,
    /// `localityName`
    pub locality: String,
    /// `organizationName`
    pub organization: String,
    /// `organizationalUnitName` of the root.
    pub root_organizational_unit: String,
    /// `commonName` of the root.
    pub root_common_name: String,
    /// Role to OU mapping for leaves.
    pub units: RoleUnits,
    /// Root validity, whole calendar years from issuance.
    pub root_validity_years: u16,
    /// Leaf validity, whole calendar years from issuance.
    pub leaf_validity_years: u16,
}

impl Default for IssuerProfile {
    fn default() -> Self {
        Self {
            country: "India".to_string(),
            state: "Surat".to_string(),
            locality: "Nandanvan".to_string(),
            organization: "Alpha".to_string(),
            root_organizational_unit: "Digi Cert".to_string(),
            root_common_name: "Digi Cert".to_string(),
            units: RoleUnits::default(),
            root_validity_years: 1,
            leaf_validity_years: 40,
        }
    }
}

impl IssuerProfile {
    /// Check that every DN field is set and both validity spans are positive.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("country", &self.country),
            ("state", &self.state),
            ("locality", &self.locality),
            ("organization", &self.organization),
            ("root_organizational_unit", &self.root_organizational_unit),
            ("root_common_name", &self.root_common_name),
            ("units.server", &self.units.server),
            ("units.client", &self.units.client),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(Error::Config(format!("profile.{name} must not be empty")));
        }
        if self.root_validity_years == 0 {
            return Err(Error::Config(
                "profile.root_validity_years must be at least 1".to_string(),
            ));
        }
        if self.leaf_validity_years == 0 {
            return Err(Error::Config(
                "profile.leaf_validity_years must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Subject (and issuer) name of the root certificate.
    #[must_use]
    pub fn root_name(&self) -> DistinguishedName {
        self.name(&self.root_organizational_unit, &self.root_common_name)
    }

    /// Subject name of a leaf request for `role` and host `common_name`.
    #[must_use]
    pub fn leaf_name(&self, role: Role, common_name: &str) -> DistinguishedName {
        self.name(self.units.for_role(role), common_name)
    }

    fn name(&self, unit: &str, common_name: &str) -> DistinguishedName {
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CountryName, self.country.as_str());
        dn.push(DnType::StateOrProvinceName, self.state.as_str());
        dn.push(DnType::LocalityName, self.locality.as_str());
        dn.push(DnType::OrganizationName, self.organization.as_str());
        dn.push(DnType::OrganizationalUnitName, unit);
        dn.push(DnType::CommonName, common_name);
        dn
    }
}
