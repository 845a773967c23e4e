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

//! Record store contract

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stringlens_core::{hash_of, FilterCriteria, PropertyRecord, Result};

/// Persistence contract for property records, keyed by content hash.
///
/// Implementations are the authority on uniqueness: `insert` must fail with
/// [`StringLensError::Conflict`](stringlens_core::StringLensError::Conflict)
/// when the hash is already present, even if the caller checked `exists`.
pub trait RecordStore: Send + Sync {
    /// Whether a record for `value` exists. `value` is canonicalized first.
    fn exists(&self, value: &str) -> Result<bool> {
        Ok(self.find_by_hash(&hash_of(value))?.is_some())
    }

    fn insert(&self, record: PropertyRecord) -> Result<PropertyRecord>;

    fn find_by_hash(&self, hash: &str) -> Result<Option<PropertyRecord>>;

    /// Records matching every criterion, most recently created first
    fn find_by_filters(&self, criteria: &FilterCriteria) -> Result<Vec<PropertyRecord>>;

    /// Remove a record. Returns false when nothing was stored under `hash`.
    fn delete_by_hash(&self, hash: &str) -> Result<bool>;

    fn aggregate_statistics(&self) -> Result<StoreStatistics>;
}

/// Aggregate statistics over all stored records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreStatistics {
    pub count: usize,
    pub average_length: f64,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub palindrome_count: usize,
    pub average_word_count: f64,
    pub most_recent: Option<DateTime<Utc>>,
}

impl StoreStatistics {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a PropertyRecord>) -> Self {
        let mut stats = StoreStatistics::default();
        let mut total_length = 0usize;
        let mut total_words = 0usize;

        for record in records {
            stats.count += 1;
            total_length += record.length();
            total_words += record.word_count();
            if record.is_palindrome() {
                stats.palindrome_count += 1;
            }
            stats.min_length = Some(stats.min_length.map_or(record.length(), |m| m.min(record.length())));
            stats.max_length = Some(stats.max_length.map_or(record.length(), |m| m.max(record.length())));
            if stats.most_recent.map_or(true, |t| record.created_at > t) {
                stats.most_recent = Some(record.created_at);
            }
        }

        if stats.count > 0 {
            stats.average_length = total_length as f64 / stats.count as f64;
            stats.average_word_count = total_words as f64 / stats.count as f64;
        }

        stats
    }
}
