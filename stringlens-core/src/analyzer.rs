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

//! String analyzer
//!
//! Computes the structural properties of a string. Every property is derived
//! from the canonicalized (trimmed) value, and the content hash doubles as the
//! storage key, so output must be byte-for-byte reproducible for equal input.
//!
//! ## Properties
//!
//! - `length`: character count of the trimmed value
//! - `is_palindrome`: alphanumerics only, case folded; empty after stripping is
//!   never a palindrome
//! - `unique_characters`: distinct case-folded characters, whitespace excluded
//! - `word_count`: maximal runs of non-whitespace
//! - `sha256_hash`: hex SHA-256 of the trimmed, original-case value
//! - `character_frequency`: case-folded character counts; only the literal space
//!   is skipped, tabs and newlines are counted

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};

/// Properties computed for one canonicalized string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringProperties {
    pub length: usize,
    pub is_palindrome: bool,
    pub unique_characters: usize,
    pub word_count: usize,
    pub sha256_hash: String,
    pub character_frequency: BTreeMap<char, usize>,
}

/// Output of [`analyze`]: the canonical value and its properties
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub value: String,
    pub properties: StringProperties,
}

impl Analysis {
    pub fn content_hash(&self) -> &str {
        &self.properties.sha256_hash
    }
}

/// Trim leading and trailing whitespace.
pub fn canonicalize(input: &str) -> &str {
    input.trim()
}

/// Content hash of a value, canonicalizing it first.
///
/// This is the only place identity keys are derived; inserts, lookups and
/// deletes all go through it.
pub fn hash_of(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonicalize(value).as_bytes());
    hex::encode(hasher.finalize())
}

/// Analyze a string. Total for any input; length limits are the caller's job.
pub fn analyze(input: &str) -> Analysis {
    let trimmed = canonicalize(input);

    let properties = StringProperties {
        length: trimmed.chars().count(),
        is_palindrome: is_palindrome(trimmed),
        unique_characters: unique_characters(trimmed),
        word_count: trimmed.split_whitespace().count(),
        sha256_hash: hash_of(trimmed),
        character_frequency: character_frequency(trimmed),
    };

    Analysis {
        value: trimmed.to_string(),
        properties,
    }
}

fn is_palindrome(value: &str) -> bool {
    let clean: Vec<char> = value
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();

    !clean.is_empty() && clean.iter().eq(clean.iter().rev())
}

fn unique_characters(value: &str) -> usize {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect::<HashSet<char>>()
        .len()
}

fn character_frequency(value: &str) -> BTreeMap<char, usize> {
    let mut frequency = BTreeMap::new();
    for c in value.chars().flat_map(char::to_lowercase) {
        if c == ' ' {
            continue;
        }
        *frequency.entry(c).or_insert(0) += 1;
    }
    frequency
}
