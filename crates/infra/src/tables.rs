//! In-memory state tables for the records the core owns, plus the
//! human-readable number sequences (`RFQ-2026-0001`, ...).

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::ScmError;

/// Keyed table of current aggregate states.
///
/// Writers hold the write guard across decide, ledger append and commit, so
/// readers see either the old row or the new one together with its entry.
#[derive(Debug)]
pub struct StateTable<K, V> {
    name: &'static str,
    rows: RwLock<HashMap<K, V>>,
}

impl<K, V> StateTable<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            rows: RwLock::new(HashMap::new()),
        }
    }

    pub fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<K, V>>, ScmError> {
        self.rows
            .read()
            .map_err(|_| ScmError::internal(format!("{} table lock poisoned", self.name)))
    }

    pub fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<K, V>>, ScmError> {
        self.rows
            .write()
            .map_err(|_| ScmError::internal(format!("{} table lock poisoned", self.name)))
    }

    pub fn get(&self, key: &K) -> Result<Option<V>, ScmError> {
        Ok(self.read()?.get(key).cloned())
    }

    pub fn list(&self) -> Result<Vec<V>, ScmError> {
        Ok(self.read()?.values().cloned().collect())
    }
}

/// Per-prefix, per-year counters.
#[derive(Debug, Default)]
pub struct NumberSequence {
    counters: Mutex<HashMap<(String, i32), u32>>,
}

impl NumberSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next number, e.g. `next("RFQ", 2026)` -> `RFQ-2026-0001`.
    pub fn next(&self, prefix: &str, year: i32) -> String {
        match self.issue_with(prefix, year, Ok::<_, std::convert::Infallible>) {
            Ok(number) => number,
            Err(never) => match never {},
        }
    }

    /// Hand the next number to `create`; the number is consumed only if it succeeds.
    ///
    /// The counter stays locked while `create` runs, so two creates never see
    /// the same candidate.
    pub fn issue_with<T, E>(
        &self,
        prefix: &str,
        year: i32,
        create: impl FnOnce(String) -> Result<T, E>,
    ) -> Result<T, E> {
        // A poisoned counter map is still consistent: increments are atomic.
        let mut counters = match self.counters.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let n = counters.entry((prefix.to_string(), year)).or_insert(0);
        let created = create(format!("{prefix}-{year}-{:04}", *n + 1))?;
        *n += 1;
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_zero_padded_per_prefix_and_year() {
        let seq = NumberSequence::new();
        assert_eq!(seq.next("RFQ", 2026), "RFQ-2026-0001");
        assert_eq!(seq.next("RFQ", 2026), "RFQ-2026-0002");
        assert_eq!(seq.next("IN", 2026), "IN-2026-0001");
        assert_eq!(seq.next("RFQ", 2027), "RFQ-2027-0001");
    }

    #[test]
    fn failed_issue_leaves_the_number_free() {
        let seq = NumberSequence::new();
        let rejected: Result<String, &str> = seq.issue_with("SHP", 2026, |_| Err("bad input"));
        assert!(rejected.is_err());
        let issued: Result<String, &str> = seq.issue_with("SHP", 2026, Ok);
        assert_eq!(issued.unwrap(), "SHP-2026-0001");
        assert_eq!(seq.next("SHP", 2026), "SHP-2026-0002");
    }

    #[test]
    fn table_round_trip() {
        let table: StateTable<u32, String> = StateTable::new("test");
        table.write().unwrap().insert(1, "one".into());
        assert_eq!(table.get(&1).unwrap().as_deref(), Some("one"));
        assert_eq!(table.list().unwrap().len(), 1);
        assert!(table.get(&2).unwrap().is_none());
    }
}
