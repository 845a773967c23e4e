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

//! String analysis endpoints
//!
//! - `POST /strings`: analyze and store a value
//! - `GET /strings`: list records matching structured filters
//! - `GET /strings/:key`: fetch one record
//! - `DELETE /strings/:key`: remove one record
//!
//! `:key` is either the content hash of a stored record or the raw value,
//! which is hashed the same way inserts are.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stringlens_core::{hash_of, FilterCriteria, FilterKey, FilterSet, PropertyRecord};
use stringlens_storage::RecordStore;
use tracing::{debug, info};

use crate::api::{ApiError, AppState};
use crate::validation::validate_value_body;

/// Structured filter parameters for `GET /strings`
#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
    pub is_palindrome: Option<String>,
    pub min_length: Option<String>,
    pub max_length: Option<String>,
    pub word_count: Option<String>,
    pub contains_character: Option<String>,
}

impl FilterParams {
    pub fn into_filter_set(self) -> FilterSet {
        [
            (FilterKey::IsPalindrome, self.is_palindrome),
            (FilterKey::MinLength, self.min_length),
            (FilterKey::MaxLength, self.max_length),
            (FilterKey::WordCount, self.word_count),
            (FilterKey::ContainsCharacter, self.contains_character),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct FilterResponse {
    pub data: Vec<PropertyRecord>,
    pub count: usize,
    pub filters_applied: FilterCriteria,
}

/// POST /strings
pub async fn create_string(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<PropertyRecord>), ApiError> {
    let Json(body) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let value = validate_value_body(&body, &state.limits)?;

    if state.store.exists(&value)? {
        return Err(ApiError::Conflict(
            "String already exists in the system".to_string(),
        ));
    }

    let record = state.store.insert(PropertyRecord::analyze_now(&value))?;
    info!(
        hash = %record.content_hash,
        length = record.length(),
        "Stored string analysis"
    );

    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /strings/:key
pub async fn get_string(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<PropertyRecord>, ApiError> {
    lookup(state.store.as_ref(), &key)?
        .map(Json)
        .ok_or_else(not_found)
}

/// DELETE /strings/:key
pub async fn delete_string(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode, ApiError> {
    let record = lookup(state.store.as_ref(), &key)?.ok_or_else(not_found)?;

    if !state.store.delete_by_hash(&record.content_hash)? {
        return Err(not_found());
    }

    info!(hash = %record.content_hash, "Deleted string");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /strings?is_palindrome=&min_length=&max_length=&word_count=&contains_character=
pub async fn list_strings(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> Result<Json<FilterResponse>, ApiError> {
    let criteria = params.into_filter_set().parse()?;
    let data = state.store.find_by_filters(&criteria)?;
    debug!(count = data.len(), filters = ?criteria, "Listed strings");

    Ok(Json(FilterResponse {
        count: data.len(),
        data,
        filters_applied: criteria,
    }))
}

fn not_found() -> ApiError {
    ApiError::NotFound("String does not exist in the system".to_string())
}

fn looks_like_hash(key: &str) -> bool {
    key.len() == 64 && key.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Resolve a path key to a stored record: hash first, then raw value.
fn lookup(store: &dyn RecordStore, key: &str) -> Result<Option<PropertyRecord>, ApiError> {
    if looks_like_hash(key) {
        if let Some(record) = store.find_by_hash(key)? {
            return Ok(Some(record));
        }
    }
    Ok(store.find_by_hash(&hash_of(key))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stringlens_storage::LogRecordStore;

    #[test]
    fn test_filter_params_skip_absent_keys() {
        let params = FilterParams {
            is_palindrome: Some("true".to_string()),
            word_count: Some("2".to_string()),
            ..Default::default()
        };
        let set = params.into_filter_set();

        assert_eq!(set.len(), 2);
        assert_eq!(set.get(FilterKey::IsPalindrome), Some("true"));
        assert_eq!(set.get(FilterKey::WordCount), Some("2"));
    }

    #[test]
    fn test_lookup_by_hash_or_value() {
        let store = LogRecordStore::in_memory();
        let record = store.insert(PropertyRecord::analyze_now("madam")).unwrap();

        let by_hash = lookup(&store, &record.content_hash).unwrap().unwrap();
        let by_value = lookup(&store, "madam").unwrap().unwrap();
        assert_eq!(by_hash, by_value);

        assert!(lookup(&store, "adam").unwrap().is_none());
    }

    #[test]
    fn test_looks_like_hash() {
        assert!(looks_like_hash(&hash_of("x")));
        assert!(!looks_like_hash("madam"));
        assert!(!looks_like_hash(&hash_of("x").to_uppercase()));
    }
}
