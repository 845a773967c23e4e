// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Filter model
//!
//! A [`FilterSet`] is the raw mapping of filter name to string value, as
//! produced by the query translator or read from request parameters. Setting a
//! key twice keeps the last value. [`FilterSet::parse`] validates it into typed
//! [`FilterCriteria`], which the record store evaluates with AND semantics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, StringLensError};
use crate::record::PropertyRecord;

/// Recognized filter names
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKey {
    IsPalindrome,
    MinLength,
    MaxLength,
    WordCount,
    ContainsCharacter,
}

impl FilterKey {
    pub const ALL: [FilterKey; 5] = [
        FilterKey::IsPalindrome,
        FilterKey::MinLength,
        FilterKey::MaxLength,
        FilterKey::WordCount,
        FilterKey::ContainsCharacter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKey::IsPalindrome => "is_palindrome",
            FilterKey::MinLength => "min_length",
            FilterKey::MaxLength => "max_length",
            FilterKey::WordCount => "word_count",
            FilterKey::ContainsCharacter => "contains_character",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw filter mapping; absent keys place no constraint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet {
    entries: BTreeMap<FilterKey, String>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a key, replacing any earlier value. Returns the replaced value.
    pub fn set(&mut self, key: FilterKey, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key, value.into())
    }

    /// Builder form of [`FilterSet::set`]
    pub fn with(mut self, key: FilterKey, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: FilterKey) -> Option<&str> {
        self.entries.get(&key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FilterKey, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Validate raw values into typed criteria.
    pub fn parse(&self) -> Result<FilterCriteria> {
        let mut criteria = FilterCriteria::default();

        for (key, raw) in self.iter() {
            match key {
                FilterKey::IsPalindrome => {
                    criteria.is_palindrome = Some(parse_bool(key, raw)?);
                }
                FilterKey::MinLength => criteria.min_length = Some(parse_count(key, raw)?),
                FilterKey::MaxLength => criteria.max_length = Some(parse_count(key, raw)?),
                FilterKey::WordCount => criteria.word_count = Some(parse_count(key, raw)?),
                FilterKey::ContainsCharacter => {
                    criteria.contains_character = Some(parse_char(key, raw)?);
                }
            }
        }

        if let (Some(min), Some(max)) = (criteria.min_length, criteria.max_length) {
            if min > max {
                return Err(StringLensError::ConflictingFilters(format!(
                    "min_length ({}) is greater than max_length ({})",
                    min, max
                )));
            }
        }

        Ok(criteria)
    }
}

impl FromIterator<(FilterKey, String)> for FilterSet {
    fn from_iter<I: IntoIterator<Item = (FilterKey, String)>>(iter: I) -> Self {
        let mut set = FilterSet::new();
        for (key, value) in iter {
            set.set(key, value);
        }
        set
    }
}

fn parse_bool(key: FilterKey, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(StringLensError::validation(format!(
            "Invalid value for {}: expected true or false, got '{}'",
            key, raw
        ))),
    }
}

fn parse_count(key: FilterKey, raw: &str) -> Result<usize> {
    raw.trim().parse::<usize>().map_err(|_| {
        StringLensError::validation(format!(
            "Invalid value for {}: expected a non-negative integer, got '{}'",
            key, raw
        ))
    })
}

// Folded like analyzer frequency keys. A character whose lowercase form spans
// several characters (such as 'İ') can never be a key, so it is rejected.
fn parse_char(key: FilterKey, raw: &str) -> Result<char> {
    let mut chars = raw.chars();
    let c = match (chars.next(), chars.next()) {
        (Some(c), None) => c,
        _ => {
            return Err(StringLensError::validation(format!(
                "Invalid value for {}: expected a single character, got '{}'",
                key, raw
            )))
        }
    };

    let mut folded = c.to_lowercase();
    match (folded.next(), folded.next()) {
        (Some(lower), None) => Ok(lower),
        _ => Err(StringLensError::validation(format!(
            "Invalid value for {}: '{}' has no single-character lowercase form",
            key, raw
        ))),
    }
}

/// Validated filters. Every present field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_palindrome: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains_character: Option<char>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self == &FilterCriteria::default()
    }

    pub fn matches(&self, record: &PropertyRecord) -> bool {
        if let Some(expected) = self.is_palindrome {
            if record.is_palindrome() != expected {
                return false;
            }
        }
        if let Some(min) = self.min_length {
            if record.length() < min {
                return false;
            }
        }
        if let Some(max) = self.max_length {
            if record.length() > max {
                return false;
            }
        }
        if let Some(count) = self.word_count {
            if record.word_count() != count {
                return false;
            }
        }
        if let Some(c) = self.contains_character {
            if !record.contains_character(c) {
                return false;
            }
        }
        true
    }
}
