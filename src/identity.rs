//! Gateway service identity

use std::fmt;
use std::str::FromStr;

use crate::error::ProvisionError;

/// Reserved prefix every gateway identity carries
///
/// Keyring profiles and the gateway init units only match instances
/// created through the bootstrap key with this prefix.
pub const IDENTITY_PREFIX: &str = "rgw.";

/// A validated gateway identity such as `rgw.gateway1`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceIdentity {
    name: String,
}

impl ServiceIdentity {
    pub fn parse(name: &str) -> Result<Self, ProvisionError> {
        if !name.starts_with(IDENTITY_PREFIX) {
            return Err(ProvisionError::InvalidIdentity(format!(
                "rgw name must start with '{}', got '{}'",
                IDENTITY_PREFIX, name
            )));
        }
        if name.len() == IDENTITY_PREFIX.len() {
            return Err(ProvisionError::InvalidIdentity(format!(
                "rgw name '{}' has nothing after the prefix",
                name
            )));
        }
        if name.contains('/') || name.chars().any(char::is_whitespace) {
            return Err(ProvisionError::InvalidIdentity(format!(
                "rgw name '{}' must not contain '/' or whitespace",
                name
            )));
        }
        Ok(Self {
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Principal in the cluster auth registry
    pub fn principal(&self) -> String {
        format!("client.{}", self.name)
    }
}

impl FromStr for ServiceIdentity {
    type Err = ProvisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ServiceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
