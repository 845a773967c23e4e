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

//! Persisted property records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analyzer::{analyze, Analysis, StringProperties};

/// The immutable result of analyzing one string, stamped with its first
/// persistence time. Serializes to the wire shape
/// `{ id, value, properties, created_at }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRecord {
    #[serde(rename = "id")]
    pub content_hash: String,
    pub value: String,
    pub properties: StringProperties,
    pub created_at: DateTime<Utc>,
}

impl PropertyRecord {
    pub fn new(analysis: Analysis, created_at: DateTime<Utc>) -> Self {
        Self {
            content_hash: analysis.properties.sha256_hash.clone(),
            value: analysis.value,
            properties: analysis.properties,
            created_at,
        }
    }

    /// Analyze `input` and stamp the record with the current time
    pub fn analyze_now(input: &str) -> Self {
        Self::new(analyze(input), Utc::now())
    }

    pub fn length(&self) -> usize {
        self.properties.length
    }

    pub fn word_count(&self) -> usize {
        self.properties.word_count
    }

    pub fn is_palindrome(&self) -> bool {
        self.properties.is_palindrome
    }

    pub fn contains_character(&self, c: char) -> bool {
        self.properties.character_frequency.contains_key(&c)
    }
}
