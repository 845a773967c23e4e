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

use std::sync::Arc;

use stringlens_query::QueryTranslator;
use stringlens_storage::RecordStore;

use crate::config::LimitsConfig;

pub mod error;
pub mod health;
pub mod natural_language;
pub mod stats;
pub mod strings;

pub use error::ApiError;
pub use health::health_check;
pub use natural_language::filter_by_natural_language;
pub use stats::get_statistics;
pub use strings::{create_string, delete_string, get_string, list_strings};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub translator: &'static QueryTranslator,
    pub limits: LimitsConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, limits: LimitsConfig) -> Self {
        Self {
            store,
            translator: QueryTranslator::shared(),
            limits,
        }
    }
}
