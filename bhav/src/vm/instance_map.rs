use std::mem;
use std::collections::hash_map::Entry;
use std::hash::Hash;
use rustc_hash::FxHashMap;

/// A hash map that preserves insertion order.
///
/// This maps object ids to entities. The scheduler walks entities in registration order, so
/// removal shifts later entries down rather than swapping the last entry into the hole.
pub struct InstanceMap<K, V> where K: Copy + Eq + Hash {
    keys: FxHashMap<K, usize>,
    values: Vec<(K, V)>,
}

impl<K, V> Default for InstanceMap<K, V> where K: Copy + Eq + Hash {
    fn default() -> Self {
        InstanceMap {
            keys: FxHashMap::default(),
            values: Vec::default(),
        }
    }
}

impl<K, V> InstanceMap<K, V> where K: Copy + Eq + Hash {
    pub fn len(&self) -> usize { self.values.len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn contains_key(&self, key: K) -> bool { self.keys.contains_key(&key) }

    pub fn get(&self, key: K) -> Option<&V> {
        let &index = self.keys.get(&key)?;
        Some(&self.values[index].1)
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        let &index = self.keys.get(&key)?;
        Some(&mut self.values[index].1)
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.values.iter().map(|&(key, _)| key)
    }

    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.keys.entry(key) {
            Entry::Occupied(entry) => {
                let old = mem::replace(&mut self.values[*entry.get()].1, value);
                Some(old)
            }

            Entry::Vacant(entry) => {
                entry.insert(self.values.len());
                self.values.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: K) -> Option<V> {
        let index = self.keys.remove(&key)?;
        let (_, value) = self.values.remove(index);
        for index in self.keys.values_mut().filter(|&&mut i| i > index) {
            *index -= 1;
        }
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::InstanceMap;

    #[test]
    fn order() {
        let mut map = InstanceMap::default();
        assert_eq!(map.insert(3, "c"), None);
        assert_eq!(map.insert(1, "a"), None);
        assert_eq!(map.insert(2, "b"), None);
        assert_eq!(map.keys().collect::<Vec<_>>(), [3, 1, 2]);

        assert_eq!(map.insert(1, "d"), Some("a"));
        assert_eq!(map.keys().collect::<Vec<_>>(), [3, 1, 2]);

        assert_eq!(map.remove(3), Some("c"));
        assert_eq!(map.remove(3), None);
        assert_eq!(map.keys().collect::<Vec<_>>(), [1, 2]);
        assert_eq!(map.get(2), Some(&"b"));
        assert_eq!(map.get(1), Some(&"d"));

        map.insert(3, "e");
        assert_eq!(map.keys().collect::<Vec<_>>(), [1, 2, 3]);
        assert_eq!(map.len(), 3);
    }
}
