use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid ISIN {value:?}: expected a non-empty alphanumeric identifier")]
pub struct IsinError {
    value: String,
}

/// Provider-side key for a fund scheme.
///
/// mfapi.in identifies schemes by a numeric AMFI code; everything that talks
/// to the NAV layer is keyed by this.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct SchemeCode(u32);

impl SchemeCode {
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SchemeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u32> for SchemeCode {
    fn from(code: u32) -> Self {
        Self(code)
    }
}

/// ISIN as reported by broker exports.
///
/// This is the stable external identifier for a fund; scheme codes are an
/// implementation detail of the NAV provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Isin(String);

impl Isin {
    /// Create an ISIN from an arbitrary string, normalizing case and
    /// rejecting values that could not possibly be one.
    pub fn new(value: impl Into<String>) -> Result<Self, IsinError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() || !value.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(IsinError { value });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Isin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for Isin {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Identity of a mutual fund scheme: the external ISIN, the NAV-provider
/// scheme code it maps to, and a display name. The pairing is fixed once
/// assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundIdentity {
    pub scheme_code: SchemeCode,
    pub isin: Isin,
    pub name: String,
}

impl FundIdentity {
    pub fn new(scheme_code: SchemeCode, isin: Isin, name: impl Into<String>) -> Self {
        Self {
            scheme_code,
            isin,
            name: name.into(),
        }
    }
}
