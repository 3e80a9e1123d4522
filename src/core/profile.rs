//! Release profiles and the binary roles they package.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The role a binary plays in a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The main application binary. Always mandatory.
    Client,
    /// The companion server binary. Only packaged under [`ReleaseProfile::Dual`].
    Server,
}

impl Role {
    /// Get the role name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Server => "server",
        }
    }

    /// Suffix appended to the binary base name for this role.
    ///
    /// The client carries no suffix so its file keeps the plain base name.
    pub fn name_suffix(&self) -> &'static str {
        match self {
            Role::Client => "",
            Role::Server => "-server",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many binaries a release consists of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseProfile {
    /// One client binary.
    #[default]
    Single,
    /// A client binary plus an optional server binary.
    Dual,
}

impl ReleaseProfile {
    /// Roles considered by this profile, mandatory ones first.
    pub fn roles(&self) -> &'static [Role] {
        match self {
            ReleaseProfile::Single => &[Role::Client],
            ReleaseProfile::Dual => &[Role::Client, Role::Server],
        }
    }

    /// Whether a missing binary for `role` aborts the release.
    pub fn is_mandatory(&self, role: Role) -> bool {
        role == Role::Client
    }

    /// Get the profile name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseProfile::Single => "single",
            ReleaseProfile::Dual => "dual",
        }
    }
}

impl fmt::Display for ReleaseProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReleaseProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" => Ok(ReleaseProfile::Single),
            "dual" => Ok(ReleaseProfile::Dual),
            _ => Err(format!(
                "invalid release profile '{}'; expected 'single' or 'dual'",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_parse() {
        assert_eq!("single".parse::<ReleaseProfile>().unwrap(), ReleaseProfile::Single);
        assert_eq!("Dual".parse::<ReleaseProfile>().unwrap(), ReleaseProfile::Dual);
        assert!("both".parse::<ReleaseProfile>().is_err());
    }

    #[test]
    fn test_profile_roles() {
        assert_eq!(ReleaseProfile::Single.roles(), &[Role::Client]);
        assert_eq!(ReleaseProfile::Dual.roles(), &[Role::Client, Role::Server]);
        assert!(ReleaseProfile::Dual.is_mandatory(Role::Client));
        assert!(!ReleaseProfile::Dual.is_mandatory(Role::Server));
    }
}
