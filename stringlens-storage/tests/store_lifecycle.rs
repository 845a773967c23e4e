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

//! Store behavior under concurrent writers and across restarts

use std::sync::Arc;
use std::thread;

use stringlens_core::{hash_of, FilterCriteria, PropertyRecord, StringLensError};
use stringlens_storage::{LogRecordStore, RecordStore};
use tempfile::tempdir;

#[test]
fn concurrent_duplicate_inserts_admit_exactly_one() {
    let dir = tempdir().unwrap();
    let store = Arc::new(LogRecordStore::open(dir.path()).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || store.insert(PropertyRecord::analyze_now("racecar")))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let inserted = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(StringLensError::Conflict(_))))
        .count();

    assert_eq!(inserted, 1);
    assert_eq!(conflicts, 7);

    drop(store);
    let reopened = LogRecordStore::open(dir.path()).unwrap();
    assert_eq!(reopened.len(), 1);
}

#[test]
fn delete_then_reinsert_gets_new_timestamp() {
    let dir = tempdir().unwrap();
    let store = LogRecordStore::open(dir.path()).unwrap();

    let first = store.insert(PropertyRecord::analyze_now("madam")).unwrap();
    assert!(store.delete_by_hash(&hash_of("madam")).unwrap());

    std::thread::sleep(std::time::Duration::from_millis(5));
    let second = store.insert(PropertyRecord::analyze_now("madam")).unwrap();

    assert_eq!(first.content_hash, second.content_hash);
    assert!(second.created_at > first.created_at);

    drop(store);
    let store = LogRecordStore::open(dir.path()).unwrap();
    let stored = store.find_by_hash(&hash_of("madam")).unwrap().unwrap();
    assert_eq!(stored.created_at, second.created_at);
}

#[test]
fn statistics_survive_reopen() {
    let dir = tempdir().unwrap();
    {
        let store = LogRecordStore::open(dir.path()).unwrap();
        for value in ["level", "two words", "x"] {
            store.insert(PropertyRecord::analyze_now(value)).unwrap();
        }
    }

    let store = LogRecordStore::open(dir.path()).unwrap();
    let stats = store.aggregate_statistics().unwrap();
    assert_eq!(stats.count, 3);
    assert_eq!(stats.palindrome_count, 2);
    assert_eq!(stats.min_length, Some(1));
    assert_eq!(stats.max_length, Some(9));
    assert_eq!(
        store.find_by_filters(&FilterCriteria::default()).unwrap().len(),
        3
    );
}
