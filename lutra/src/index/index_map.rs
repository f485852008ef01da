use im::{OrdMap, OrdSet};

use crate::collection::ObjectId;
use crate::common::Value;
use std::ops::Bound;

/// Ordered mapping from an indexed field's value to the set of document ids
/// holding that value.
///
/// Backed by persistent maps (`im`), so cloning an `IndexMap` into a read
/// snapshot is O(1) and mutations inside the owning collection never disturb
/// snapshots already handed out.
#[derive(Clone, Default)]
pub struct IndexMap {
    entries: OrdMap<Value, OrdSet<ObjectId>>,
}

impl IndexMap {
    pub fn new() -> Self {
        IndexMap {
            entries: OrdMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The number of distinct indexed values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Records `id` under `value`.
    pub fn add_entry(&mut self, value: Value, id: ObjectId) {
        self.entries.entry(value).or_default().insert(id);
    }

    /// Removes `id` from under `value`, dropping the value's entry when its
    /// id set becomes empty.
    pub fn remove_entry(&mut self, value: &Value, id: &ObjectId) {
        let emptied = match self.entries.get_mut(value) {
            Some(ids) => {
                ids.remove(id);
                ids.is_empty()
            }
            None => false,
        };
        if emptied {
            self.entries.remove(value);
        }
    }

    /// The ids stored under an exact value.
    pub fn get(&self, value: &Value) -> Option<&OrdSet<ObjectId>> {
        self.entries.get(value)
    }

    /// Collects all ids whose key falls within the given bounds, in key
    /// order.
    pub fn scan(&self, lower: Bound<Value>, upper: Bound<Value>) -> OrdSet<ObjectId> {
        let mut result = OrdSet::new();
        for (_, ids) in self.entries.range((lower, upper)) {
            for id in ids {
                result.insert(*id);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> ObjectId {
        ObjectId::from_timestamp(n)
    }

    #[test]
    fn test_add_and_get() {
        let mut map = IndexMap::new();
        map.add_entry(Value::Int(5), id(1));
        map.add_entry(Value::Int(5), id(2));
        map.add_entry(Value::Int(7), id(3));

        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&Value::Int(5)).unwrap().len(), 2);
    }

    #[test]
    fn test_remove_drops_empty_value() {
        let mut map = IndexMap::new();
        map.add_entry(Value::Int(5), id(1));
        map.remove_entry(&Value::Int(5), &id(1));
        assert!(map.is_empty());
        // removing again is a no-op
        map.remove_entry(&Value::Int(5), &id(1));
    }

    #[test]
    fn test_scan_range() {
        let mut map = IndexMap::new();
        for n in 0..10 {
            map.add_entry(Value::Int(n), id(n as u32));
        }

        let hits = map.scan(Bound::Included(Value::Int(3)), Bound::Excluded(Value::Int(6)));
        assert_eq!(hits.len(), 3);
        assert!(hits.contains(&id(3)));
        assert!(hits.contains(&id(5)));
        assert!(!hits.contains(&id(6)));
    }

    #[test]
    fn test_scan_unbounded() {
        let mut map = IndexMap::new();
        for n in 0..5 {
            map.add_entry(Value::Int(n), id(n as u32));
        }
        let hits = map.scan(Bound::Unbounded, Bound::Unbounded);
        assert_eq!(hits.len(), 5);
    }
}
