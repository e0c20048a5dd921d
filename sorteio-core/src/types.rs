use crate::error::{Result, SorteioError};
use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// A participant's display name.
///
/// Always trimmed and non-empty. Equality for duplicate detection is
/// case-insensitive (see [`Participant::matches`]); the original casing is
/// kept for display and storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Participant(String);

impl Participant {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SorteioError::EmptyName);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison used for the pool uniqueness check.
    pub fn matches(&self, other: &Participant) -> bool {
        self.fold_key() == other.fold_key()
    }

    /// Caseless key: NFC-normalized, then upper- and lower-cased so that
    /// expansions like `ß` -> `SS` fold to the same key as their spelled-out
    /// form.
    pub fn fold_key(&self) -> String {
        self.0.nfc().collect::<String>().to_uppercase().to_lowercase()
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Participant {
    type Error = SorteioError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Participant> for String {
    fn from(p: Participant) -> Self {
        p.0
    }
}

impl AsRef<str> for Participant {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Point-in-time copy of the registry, for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamesSnapshot {
    pub available: Vec<Participant>,
    pub drawn: Vec<Participant>,
}

impl NamesSnapshot {
    pub fn total(&self) -> usize {
        self.available.len() + self.drawn.len()
    }
}
