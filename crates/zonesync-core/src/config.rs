//! Configuration types for zonesync
//!
//! Providers are described by [`ProviderConfig`], a closed set of backends
//! selected by the `"provider"` tag. A credentials file maps destination
//! names to provider configs:
//!
//! ```json
//! {
//!   "zonesync": {
//!     "provider": "cloudflare",
//!     "zone_id": "023e105f4ecef8ad9ca31a8372d0c353",
//!     "token": "..."
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Backend configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Zone file on disk
    Filesystem {
        /// Path to the zone file
        path: String,
    },

    /// Zone text held in memory
    Memory {
        /// Initial zone text
        #[serde(default)]
        string: String,
    },

    /// Cloudflare API v4
    Cloudflare {
        /// Zone identifier
        zone_id: String,
        /// API token (bearer auth)
        #[serde(default)]
        token: Option<String>,
        /// Account email (legacy global key auth)
        #[serde(default)]
        email: Option<String>,
        /// Global API key (legacy global key auth)
        #[serde(default)]
        key: Option<String>,
    },

    /// Amazon Route 53
    Route53 {
        /// Hosted zone identifier
        hosted_zone_id: String,
        /// AWS access key id
        aws_access_key_id: String,
        /// AWS secret access key
        aws_secret_access_key: String,
        /// Signing region
        #[serde(default = "default_aws_region")]
        aws_region: String,
    },
}

fn default_aws_region() -> String {
    "us-east-1".to_string()
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Filesystem { path } => {
                if path.is_empty() {
                    return Err(crate::Error::config("Filesystem path cannot be empty"));
                }
                Ok(())
            }
            ProviderConfig::Memory { .. } => Ok(()),
            ProviderConfig::Cloudflare {
                zone_id,
                token,
                email,
                key,
            } => {
                if zone_id.is_empty() {
                    return Err(crate::Error::config("Cloudflare zone_id cannot be empty"));
                }
                let has_token = token.as_deref().is_some_and(|t| !t.is_empty());
                let has_key = email.as_deref().is_some_and(|e| !e.is_empty())
                    && key.as_deref().is_some_and(|k| !k.is_empty());
                if !has_token && !has_key {
                    return Err(crate::Error::config(
                        "Cloudflare needs either a token or an email and key",
                    ));
                }
                Ok(())
            }
            ProviderConfig::Route53 {
                hosted_zone_id,
                aws_access_key_id,
                aws_secret_access_key,
                aws_region,
            } => {
                let required = [
                    ("hosted_zone_id", hosted_zone_id),
                    ("aws_access_key_id", aws_access_key_id),
                    ("aws_secret_access_key", aws_secret_access_key),
                    ("aws_region", aws_region),
                ];
                for (field, value) in required {
                    if value.is_empty() {
                        return Err(crate::Error::config(format!(
                            "Route53 {} cannot be empty",
                            field
                        )));
                    }
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &'static str {
        match self {
            ProviderConfig::Filesystem { .. } => "filesystem",
            ProviderConfig::Memory { .. } => "memory",
            ProviderConfig::Cloudflare { .. } => "cloudflare",
            ProviderConfig::Route53 { .. } => "route53",
        }
    }
}

// Secrets never reach logs
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const REDACTED: &str = "<redacted>";
        match self {
            ProviderConfig::Filesystem { path } => {
                f.debug_struct("Filesystem").field("path", path).finish()
            }
            ProviderConfig::Memory { string } => f
                .debug_struct("Memory")
                .field("len", &string.len())
                .finish(),
            ProviderConfig::Cloudflare {
                zone_id, email, ..
            } => f
                .debug_struct("Cloudflare")
                .field("zone_id", zone_id)
                .field("email", email)
                .field("credentials", &REDACTED)
                .finish(),
            ProviderConfig::Route53 {
                hosted_zone_id,
                aws_access_key_id,
                aws_region,
                ..
            } => f
                .debug_struct("Route53")
                .field("hosted_zone_id", hosted_zone_id)
                .field("aws_access_key_id", aws_access_key_id)
                .field("aws_secret_access_key", &REDACTED)
                .field("aws_region", aws_region)
                .finish(),
        }
    }
}

/// Named provider configurations, as read from a credentials file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials {
    entries: BTreeMap<String, ProviderConfig>,
}

impl Credentials {
    /// Parse a credentials JSON document
    pub fn from_json(text: &str) -> Result<Self, crate::Error> {
        Ok(serde_json::from_str(text)?)
    }

    /// Look up and validate the config for destination `name`
    pub fn get(&self, name: &str) -> Result<&ProviderConfig, crate::Error> {
        let config = self.entries.get(name).ok_or_else(|| {
            crate::Error::config(format!("No credentials configured for '{}'", name))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Add or replace an entry
    pub fn insert(&mut self, name: impl Into<String>, config: ProviderConfig) {
        self.entries.insert(name.into(), config);
    }
}

/// Options for a sync run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Log operations without applying them
    #[serde(default)]
    pub dry_run: bool,

    /// Skip the safety checks
    #[serde(default)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_config_tagged_by_provider() {
        let credentials = Credentials::from_json(
            r#"{
                "zonesync": {"provider": "cloudflare", "zone_id": "abc", "token": "secret"},
                "aws": {
                    "provider": "route53",
                    "hosted_zone_id": "Z123",
                    "aws_access_key_id": "AKID",
                    "aws_secret_access_key": "shh"
                },
                "local": {"provider": "filesystem", "path": "zones/example.com"}
            }"#,
        )
        .unwrap();

        let cloudflare = credentials.get("zonesync").unwrap();
        assert_eq!(cloudflare.type_name(), "cloudflare");

        match credentials.get("aws").unwrap() {
            ProviderConfig::Route53 { aws_region, .. } => assert_eq!(aws_region, "us-east-1"),
            other => panic!("unexpected config {:?}", other),
        }
        assert_eq!(credentials.get("local").unwrap().type_name(), "filesystem");
    }

    #[test]
    fn test_missing_destination() {
        let err = Credentials::default().get("zonesync").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_cloudflare_needs_credentials() {
        let config = ProviderConfig::Cloudflare {
            zone_id: "abc".into(),
            token: None,
            email: Some("ops@example.com".into()),
            key: None,
        };
        assert!(config.validate().is_err());

        let config = ProviderConfig::Cloudflare {
            zone_id: "abc".into(),
            token: None,
            email: Some("ops@example.com".into()),
            key: Some("key".into()),
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ProviderConfig::Route53 {
            hosted_zone_id: "Z123".into(),
            aws_access_key_id: "AKID".into(),
            aws_secret_access_key: "very-secret".into(),
            aws_region: "eu-west-1".into(),
        };
        let debug = format!("{:?}", config);
        assert!(debug.contains("Z123"));
        assert!(!debug.contains("very-secret"));
    }
}
