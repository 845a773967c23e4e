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

//! Stringlens Storage Layer
//!
//! Persistence for property records, keyed by content hash.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stringlens_core::PropertyRecord;
//! use stringlens_storage::{LogRecordStore, RecordStore};
//!
//! let store = LogRecordStore::open("./stringlens-data")?;
//! store.insert(PropertyRecord::analyze_now("madam"))?;
//! ```

pub mod error;
pub mod log_store;
pub mod store;

pub use error::StorageError;
pub use log_store::{LogRecordStore, LogStoreConfig};
pub use store::{RecordStore, StoreStatistics};
