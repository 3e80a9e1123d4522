//! Captured toolchain environments.

use std::collections::BTreeMap;

/// Variables a linker depends on. These are re-asserted under their
/// canonical names after a snapshot is imported.
pub const LINKER_VARS: [&str; 4] = ["PATH", "INCLUDE", "LIB", "LIBPATH"];

/// Destination for imported environment variables.
pub trait EnvSink {
    /// Set one variable.
    fn set_var(&mut self, key: &str, value: &str);
}

/// The environment of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSink for ProcessEnv {
    fn set_var(&mut self, key: &str, value: &str) {
        std::env::set_var(key, value);
    }
}

impl EnvSink for BTreeMap<String, String> {
    fn set_var(&mut self, key: &str, value: &str) {
        self.insert(key.to_string(), value.to_string());
    }
}

/// The full environment produced by a toolchain setup script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvironmentSnapshot {
    /// Parse a line-oriented environment dump (`set` output).
    ///
    /// Lines that do not parse are skipped; a later duplicate name wins.
    pub fn parse(contents: &str) -> Self {
        contents
            .lines()
            .filter_map(parse_line)
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    /// Parse a NUL-separated environment dump (`env -0` output).
    ///
    /// Values may span several lines.
    pub fn parse_nul(contents: &str) -> Self {
        contents
            .split('\0')
            .filter_map(parse_record)
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    /// Look up a variable, falling back to a case-insensitive match.
    ///
    /// Windows `set` prints `Path`, not `PATH`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .or_else(|| {
                self.vars
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
            .map(String::as_str)
    }

    /// Iterate variables in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Linker variables present in the snapshot, under their canonical names.
    pub fn linker_vars(&self) -> impl Iterator<Item = (&'static str, &str)> {
        LINKER_VARS
            .iter()
            .filter_map(move |name| self.get(name).map(|value| (*name, value)))
    }

    /// Number of captured variables.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Write every variable into `sink`, then re-assert the linker variables.
    ///
    /// Applying the same snapshot again leaves the sink unchanged.
    pub fn apply_to(&self, sink: &mut impl EnvSink) {
        for (key, value) in self.iter() {
            sink.set_var(key, value);
        }
        for (key, value) in self.linker_vars() {
            sink.set_var(key, value);
        }
    }
}

impl FromIterator<(String, String)> for EnvironmentSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        EnvironmentSnapshot {
            vars: iter.into_iter().collect(),
        }
    }
}

/// Split one `NAME=value` record at the first `=`, keeping newlines in the value.
fn parse_record(record: &str) -> Option<(&str, &str)> {
    let (key, value) = record.split_once('=')?;
    if key.is_empty() || key.contains(['\n', '\r']) {
        return None;
    }
    Some((key, value))
}

/// Split one `NAME=value` line at the first `=`.
///
/// Values keep any further `=` (search-path lists and flags contain them).
/// Lines without a name, or with a NUL byte, are rejected.
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    if key.is_empty() || line.contains('\0') {
        return None;
    }
    Some((key, value))
}
