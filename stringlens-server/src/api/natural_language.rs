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

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use stringlens_core::{FilterCriteria, PropertyRecord};
use tracing::debug;

use crate::api::{ApiError, AppState};
use crate::validation::validate_query;

#[derive(Debug, Deserialize)]
pub struct NaturalLanguageParams {
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InterpretedQuery {
    pub original: String,
    pub parsed_filters: FilterCriteria,
}

#[derive(Debug, Serialize)]
pub struct NaturalLanguageResponse {
    pub data: Vec<PropertyRecord>,
    pub count: usize,
    pub interpreted_query: InterpretedQuery,
}

/// GET /strings/filter-by-natural-language?query=...
///
/// Translates the query into filters and runs them against the store. A
/// query no rule understands is rejected rather than returning everything.
pub async fn filter_by_natural_language(
    State(state): State<AppState>,
    Query(params): Query<NaturalLanguageParams>,
) -> Result<Json<NaturalLanguageResponse>, ApiError> {
    let query = validate_query(params.query.as_deref(), &state.limits)?;

    let interpretation = state.translator.interpret(query);
    if interpretation.is_empty() {
        return Err(ApiError::BadRequest(
            "Unable to parse natural language query".to_string(),
        ));
    }

    let criteria = interpretation.filters.parse()?;
    let data = state.store.find_by_filters(&criteria)?;
    debug!(
        rules = ?interpretation.matched_rules,
        count = data.len(),
        "Natural language query"
    );

    Ok(Json(NaturalLanguageResponse {
        count: data.len(),
        data,
        interpreted_query: InterpretedQuery {
            original: interpretation.original,
            parsed_filters: criteria,
        },
    }))
}
