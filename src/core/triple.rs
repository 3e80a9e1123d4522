//! Target triples embedded in release file names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The triple this binary was compiled for, exported by `build.rs`.
const HOST_TRIPLE: &str = env!("TARGET");

/// A target triple (e.g., "x86_64-pc-windows-msvc").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetTriple {
    triple: String,
}

impl TargetTriple {
    /// The host triple.
    pub fn host() -> Self {
        TargetTriple {
            triple: HOST_TRIPLE.to_string(),
        }
    }

    /// Get the triple string.
    pub fn as_str(&self) -> &str {
        &self.triple
    }

    /// Get the architecture from the triple.
    pub fn arch(&self) -> &str {
        self.triple.split('-').next().unwrap_or_default()
    }

    /// Whether the triple targets Windows.
    pub fn is_windows(&self) -> bool {
        self.triple.split('-').any(|segment| segment == "windows")
    }

    /// Executable suffix for binaries built for this triple, including the dot.
    pub fn exe_suffix(&self) -> &'static str {
        if self.is_windows() {
            ".exe"
        } else {
            ""
        }
    }
}

impl FromStr for TargetTriple {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = s.split('-').collect();
        if segments.len() < 3 {
            return Err(format!(
                "invalid target triple '{}'; expected at least 3 '-'-separated segments",
                s
            ));
        }
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(format!("invalid target triple '{}'; empty segment", s));
        }
        Ok(TargetTriple {
            triple: s.to_string(),
        })
    }
}

impl fmt::Display for TargetTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.triple)
    }
}
