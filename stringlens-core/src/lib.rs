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

//! Stringlens Core
//!
//! Deterministic string analysis, content hashing, and the filter model shared
//! by the query translator, the record store, and the HTTP surface.

pub mod analyzer;
pub mod error;
pub mod filter;
pub mod record;

pub use analyzer::{analyze, canonicalize, hash_of, Analysis, StringProperties};
pub use error::{Result, StringLensError};
pub use filter::{FilterCriteria, FilterKey, FilterSet};
pub use record::PropertyRecord;
