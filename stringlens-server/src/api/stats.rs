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

use axum::{extract::State, Json};
use stringlens_storage::StoreStatistics;

use crate::api::{ApiError, AppState};

/// GET /strings/stats
pub async fn get_statistics(
    State(state): State<AppState>,
) -> Result<Json<StoreStatistics>, ApiError> {
    Ok(Json(state.store.aggregate_statistics()?))
}
