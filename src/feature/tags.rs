use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Meters per foot, for imperial height tags
const FEET_TO_METERS: f64 = 0.3048;

/// OSM tag map with typed accessors
///
/// Tag values in the wild are messy free text ("12 m", "33'", "4 1/2").
/// The accessors here absorb that: a value that fails to parse behaves
/// exactly like an absent tag, so fallback chains read linearly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(HashMap<String, String>);

impl Tags {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Raw string value of a tag
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|v| v.as_str())
    }

    /// Whether the tag is present at all
    pub fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Whether the tag is present with exactly the given value
    pub fn is_value(&self, key: &str, value: &str) -> bool {
        self.get(key) == Some(value)
    }

    /// Parse a tag as a length in meters
    ///
    /// A foot/inch mark (`'` or `"`) switches to imperial: the feet count
    /// is converted at 0.3048 m/ft and any inches remainder is discarded.
    /// Otherwise the leading number is taken as meters and trailing unit
    /// suffixes are ignored.
    pub fn meters(&self, key: &str) -> Option<f64> {
        parse_meters(self.get(key)?)
    }

    /// Parse a tag as a plain number (leading digits, no unit handling)
    pub fn number(&self, key: &str) -> Option<f64> {
        parse_leading_number(self.get(key)?)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<HashMap<String, String>> for Tags {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

fn parse_meters(raw: &str) -> Option<f64> {
    let value = raw.trim();
    if let Some(mark) = value.find(['\'', '"']) {
        let feet = parse_leading_number(&value[..mark])?;
        return Some(feet * FEET_TO_METERS);
    }
    parse_leading_number(value)
}

/// `parseFloat`-style prefix parse: take the longest numeric prefix
fn parse_leading_number(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    for (i, c) in s.char_indices() {
        match c {
            '+' | '-' if i == 0 => end = i + 1,
            '0'..='9' => {
                seen_digit = true;
                end = i + 1;
            }
            '.' if !seen_dot => {
                seen_dot = true;
                end = i + 1;
            }
            _ => break,
        }
    }

    if !seen_digit {
        return None;
    }
    s[..end].parse().ok()
}
