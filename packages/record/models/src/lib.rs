#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Keyword lists and the records extracted with them.
//!
//! A [`KeywordList`] is the only schema the extractor gets: an ordered set
//! of labels whose first element (the *anchor*) marks where each record
//! starts. Every extracted [`Record`] maps a subset of those keywords to
//! the string value found after `Keyword:` in the source text.

use std::fmt;
use std::str::FromStr;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors raised while building keywords or keyword lists.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeywordError {
    /// A keyword label was empty or only whitespace.
    #[error("Keyword must not be empty")]
    Empty,

    /// The keyword list had no usable labels.
    #[error("At least one keyword is required")]
    NoKeywords,

    /// Two labels only differ by case (matching is case-insensitive).
    #[error("Duplicate keyword: {label}")]
    Duplicate {
        /// The repeated label, as given.
        label: String,
    },
}

/// A single keyword label such as `ID` or `Color`.
///
/// Always trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Keyword(String);

impl Keyword {
    /// Creates a keyword from a label, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`KeywordError::Empty`] if nothing is left after trimming.
    pub fn new(label: &str) -> Result<Self, KeywordError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(KeywordError::Empty);
        }
        Ok(Self(label.to_owned()))
    }

    /// The label text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `other` names this keyword, ignoring case.
    #[must_use]
    pub fn matches(&self, other: &str) -> bool {
        self.0.to_lowercase() == other.trim().to_lowercase()
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Keyword {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Keyword {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Keyword {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Self::new(&label).map_err(serde::de::Error::custom)
    }
}

/// An ordered, non-empty list of distinct keywords.
///
/// The first keyword is the anchor: each occurrence of `Anchor:` in the
/// text starts a new record. Beyond that the order has no meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordList {
    keywords: Vec<Keyword>,
}

impl KeywordList {
    /// Builds a keyword list from raw labels.
    ///
    /// Labels are trimmed and blank ones are skipped.
    ///
    /// # Errors
    ///
    /// * [`KeywordError::NoKeywords`] if no label survives trimming
    /// * [`KeywordError::Duplicate`] if two labels are equal ignoring case
    pub fn new<I, S>(labels: I) -> Result<Self, KeywordError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keywords: Vec<Keyword> = Vec::new();

        for label in labels {
            let Ok(keyword) = Keyword::new(label.as_ref()) else {
                continue;
            };
            if keywords.iter().any(|k| k.matches(keyword.as_str())) {
                return Err(KeywordError::Duplicate { label: keyword.0 });
            }
            keywords.push(keyword);
        }

        if keywords.is_empty() {
            return Err(KeywordError::NoKeywords);
        }

        Ok(Self { keywords })
    }

    /// The keyword that marks record boundaries.
    #[must_use]
    pub fn anchor(&self) -> &Keyword {
        // `new` guarantees at least one keyword.
        &self.keywords[0]
    }

    /// Looks up a keyword by label, ignoring case.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&Keyword> {
        self.keywords.iter().find(|k| k.matches(label))
    }

    /// Whether `label` is one of the keywords, ignoring case.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    /// Iterates the keywords in their configured order.
    pub fn iter(&self) -> std::slice::Iter<'_, Keyword> {
        self.keywords.iter()
    }

    /// Number of keywords (always at least one).
    #[must_use]
    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

impl FromStr for KeywordList {
    type Err = KeywordError;

    /// Parses the comma-separated form, e.g. `"ID, Color, Model, Year"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.split(','))
    }
}

impl fmt::Display for KeywordList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, keyword) in self.keywords.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(keyword.as_str())?;
        }
        Ok(())
    }
}

/// One extracted record: keyword → value, in insertion order.
///
/// Keywords that were not found are absent rather than empty. Serializes
/// as a flat JSON object with keys in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(Keyword, String)>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Sets `key` to `value`.
    ///
    /// An existing key keeps its position and returns its previous value;
    /// a new key is appended.
    pub fn insert(&mut self, key: Keyword, value: impl Into<String>) -> Option<String> {
        let value = value.into();
        if let Some((_, existing)) = self.fields.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(existing, value));
        }
        self.fields.push((key, value));
        None
    }

    /// Value stored under `key` (exact label match).
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether `key` is present (exact label match).
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &Keyword> {
        self.fields.iter().map(|(k, _)| k)
    }

    /// Key/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Keyword, &str)> {
        self.fields.iter().map(|(k, v)| (k, v.as_str()))
    }

    /// Number of keys present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no keys are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(Keyword, String)> for Record {
    fn from_iter<T: IntoIterator<Item = (Keyword, String)>>(iter: T) -> Self {
        let mut record = Self::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key.as_str(), value)?;
        }
        map.end()
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = Record;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a flat object of string values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut record = Record::new();
        while let Some((key, value)) = access.next_entry::<Keyword, String>()? {
            record.insert(key, value);
        }
        Ok(record)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RecordVisitor)
    }
}
