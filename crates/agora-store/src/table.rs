//! Generic id-keyed tables with auto-increment allocation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use agora_core::Uid;

/// One persisted table: rows keyed by id plus the auto-increment counter.
///
/// Ids start at 1 and are never reused within the lifetime of a snapshot,
/// matching auto-increment columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table<T> {
    next_id: Uid,
    rows: BTreeMap<Uid, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

impl<T> Table<T> {
    /// Inserts a row built from its freshly allocated id.
    pub fn insert_with(&mut self, build: impl FnOnce(Uid) -> T) -> Uid {
        let id = self.next_id;
        self.next_id += 1;
        self.rows.insert(id, build(id));
        id
    }

    /// Looks a row up by id.
    pub fn get(&self, id: Uid) -> Option<&T> {
        self.rows.get(&id)
    }

    /// Looks a row up by id for mutation.
    pub fn get_mut(&mut self, id: Uid) -> Option<&mut T> {
        self.rows.get_mut(&id)
    }

    /// Removes a row, returning it.
    pub fn remove(&mut self, id: Uid) -> Option<T> {
        self.rows.remove(&id)
    }

    /// Whether a row with `id` exists.
    pub fn contains(&self, id: Uid) -> bool {
        self.rows.contains_key(&id)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates over all rows in id order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_increment_and_are_not_reused() {
        let mut table: Table<String> = Table::default();
        let a = table.insert_with(|id| format!("row-{id}"));
        let b = table.insert_with(|id| format!("row-{id}"));
        assert_eq!((a, b), (1, 2));

        table.remove(b);
        let c = table.insert_with(|id| format!("row-{id}"));
        assert_eq!(c, 3);
        assert_eq!(table.get(a).unwrap(), "row-1");
        assert!(table.get(b).is_none());
    }

    #[test]
    fn counter_survives_serde() {
        let mut table: Table<u8> = Table::default();
        table.insert_with(|_| 7);
        table.insert_with(|_| 8);
        table.remove(2);

        let json = serde_json::to_string(&table).unwrap();
        let mut back: Table<u8> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.insert_with(|_| 9), 3);
    }
}
