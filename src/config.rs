//! Configuration management

use std::{path::Path, path::PathBuf, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::pki::{AltName, IssuerProfile};
use crate::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP trigger configuration
    pub server: ServerConfig,
    /// What to issue and where to put it
    pub issuance: IssuanceConfig,
    /// Organisational identity and validity policy
    pub profile: IssuerProfile,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Upper bound on one issuance triggered over HTTP
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Issuance configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuanceConfig {
    /// Host identity placed in leaf CN and SAN
    pub common_name: String,
    /// Write issued PEM material to `output_dir`
    pub persist: bool,
    /// Root directory for persisted material
    pub output_dir: PathBuf,
}

impl Default for IssuanceConfig {
    fn default() -> Self {
        Self {
            common_name: "1.2.3.4".to_string(),
            persist: true,
            output_dir: PathBuf::from("Certs"),
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist, cannot be parsed,
    /// or fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        // Load from file if provided
        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        // Merge environment variables (PKI_ISSUER_ prefix)
        figment = figment.merge(Env::prefixed("PKI_ISSUER_").split("__"));

        let config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Check values the issuance pipeline depends on.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.issuance.common_name.trim().is_empty() {
            return Err(Error::Config(
                "issuance.common_name must not be empty".to_string(),
            ));
        }
        AltName::for_host(self.issuance.common_name.trim())?;
        if self.server.request_timeout.is_zero() {
            return Err(Error::Config(
                "server.request_timeout must be positive".to_string(),
            ));
        }
        self.profile.validate()
    }

    /// Render as YAML.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }
}

/// Custom humantime serde module for Duration
pub mod humantime_serde {
    use std::time::Duration;

    use serde::{self, Deserialize, Deserializer, Serializer};

    /// Serialize Duration to human-readable string (e.g., "30s", "250ms")
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the serializer fails.
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    /// Deserialize human-readable duration string (e.g., "30s", "5m", "100ms")
    ///
    /// # Errors
    ///
    /// Returns a deserialization error if the string cannot be parsed as a duration.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        // "ms" before "s" and "m", or "100ms" would parse as seconds
        if let Some(ms) = s.strip_suffix("ms") {
            ms.parse::<u64>()
                .map(Duration::from_millis)
                .map_err(serde::de::Error::custom)
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(serde::de::Error::custom)
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(serde::de::Error::custom)
        } else {
            // Assume seconds
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(serde::de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.server.request_timeout, Duration::from_secs(60));
        assert_eq!(config.issuance.common_name, "1.2.3.4");
        assert!(config.issuance.persist);
        assert_eq!(config.issuance.output_dir, PathBuf::from("Certs"));
        assert_eq!(config.profile, IssuerProfile::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_merges_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pki.yaml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            "server:\n  port: 4100\n  request_timeout: 2m\nissuance:\n  common_name: edge.internal\n  persist: false\nprofile:\n  units:\n    client: ops\n"
        )
        .unwrap();
        drop(f);

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.server.port, 4100);
        assert_eq!(config.server.request_timeout, Duration::from_secs(120));
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.issuance.common_name, "edge.internal");
        assert!(!config.issuance.persist);
        assert_eq!(config.profile.units.client, "ops");
        assert_eq!(config.profile.units.server, "Alpha");
    }

    #[test]
    fn load_rejects_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/pki.yaml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn load_rejects_invalid_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pki.yaml");
        std::fs::write(&path, "profile:\n  leaf_validity_years: 0\n").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn validate_rejects_blank_common_name() {
        let mut config = Config::default();
        config.issuance.common_name = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_common_name_that_is_not_a_host() {
        let mut config = Config::default();
        config.issuance.common_name = "bücher.example".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.issuance.common_name = "xn--bcher-kva.example".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn sub_second_timeout_survives_yaml_round_trip() {
        let mut config = Config::default();
        config.server.request_timeout = Duration::from_millis(250);

        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("request_timeout: 250ms"), "{yaml}");

        let reloaded: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(reloaded.server.request_timeout, Duration::from_millis(250));
        assert!(reloaded.validate().is_ok());

        config.server.request_timeout = Duration::from_millis(1500);
        let reloaded: Config = serde_yaml::from_str(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(reloaded.server.request_timeout, Duration::from_millis(1500));
    }

    #[test]
    fn yaml_rendering_reloads_to_same_config() {
        let config = Config::default();
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("request_timeout: 60s"));
        let reloaded: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn humantime_accepts_millis_minutes_and_bare_seconds() {
        #[derive(Deserialize)]
        struct Wrapper {
            #[serde(with = "humantime_serde")]
            d: Duration,
        }
        let parse = |s: &str| {
            serde_yaml::from_str::<Wrapper>(&format!("d: \"{s}\""))
                .unwrap()
                .d
        };
        assert_eq!(parse("250ms"), Duration::from_millis(250));
        assert_eq!(parse("3m"), Duration::from_secs(180));
        assert_eq!(parse("45"), Duration::from_secs(45));
    }
}
