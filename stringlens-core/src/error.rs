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

//! Error types shared across the workspace.

use thiserror::Error;

/// Result alias for stringlens operations
pub type Result<T> = std::result::Result<T, StringLensError>;

/// Errors surfaced by the layers around the analyzer and translator.
///
/// The analyzer and translator themselves are total and never produce these;
/// callers detect bad input before analysis and empty translations after.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StringLensError {
    /// Malformed or out-of-range input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Filters that parse individually but cannot be satisfied together
    #[error("Conflicting filters: {0}")]
    ConflictingFilters(String),

    /// A record with the same content hash already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Lookup or delete on an absent key
    #[error("Not found: {0}")]
    NotFound(String),

    /// Persistence failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl StringLensError {
    pub fn validation(msg: impl Into<String>) -> Self {
        StringLensError::Validation(msg.into())
    }
}
