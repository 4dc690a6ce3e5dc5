use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Canonical ordering used when a [`MultiSet`] has to be traversed
/// deterministically (hashing, display, serialization).
///
/// The key must be injective: distinct values need distinct keys, otherwise
/// equal multisets could hash differently.
pub trait SortKey {
    type Key: Ord;

    fn sort_key(&self) -> Self::Key;
}

/// Signed multiplicity map.
///
/// Zero multiplicities carry no meaning: they are ignored by equality and
/// hashing, and `clear_zero_count_items` drops them.
#[derive(Clone, Debug)]
pub struct MultiSet<T> {
    counts: HashMap<T, i64>,
}

impl<T> Default for MultiSet<T> {
    fn default() -> Self {
        Self {
            counts: HashMap::new(),
        }
    }
}

impl<T: Eq + Hash> MultiSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a signed count and drop the entry if it lands on zero.
    pub fn add(&mut self, item: T, count: i64) {
        match self.counts.entry(item) {
            Entry::Occupied(mut slot) => {
                *slot.get_mut() += count;
                if *slot.get() == 0 {
                    slot.remove();
                }
            }
            Entry::Vacant(slot) => {
                if count != 0 {
                    slot.insert(count);
                }
            }
        }
    }

    /// Add a signed count, leaving zero entries in place until the next
    /// `clear_zero_count_items`.
    pub fn add_unpruned(&mut self, item: T, count: i64) {
        *self.counts.entry(item).or_insert(0) += count;
    }

    pub fn add_many<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = (T, i64)>,
    {
        for (item, count) in items {
            self.add_unpruned(item, count);
        }
        self.clear_zero_count_items();
    }

    pub fn clear_zero_count_items(&mut self) {
        self.counts.retain(|_, c| *c != 0);
    }

    pub fn count(&self, item: &T) -> i64 {
        self.counts.get(item).copied().unwrap_or(0)
    }

    pub fn items(&self) -> impl Iterator<Item = (&T, i64)> {
        self.counts.iter().map(|(k, v)| (k, *v))
    }

    pub fn elements(&self) -> impl Iterator<Item = &T> {
        self.counts.keys()
    }

    pub fn counts(&self) -> impl Iterator<Item = i64> + '_ {
        self.counts.values().copied()
    }

    /// Number of entries with a nonzero multiplicity.
    pub fn len(&self) -> usize {
        self.counts.values().filter(|c| **c != 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Eq + Hash + SortKey> MultiSet<T> {
    /// Nonzero entries in sort-key order.
    pub fn sorted_items(&self) -> Vec<(&T, i64)> {
        let mut items: Vec<(T::Key, &T, i64)> = self
            .counts
            .iter()
            .filter(|(_, c)| **c != 0)
            .map(|(k, c)| (k.sort_key(), k, *c))
            .collect();
        items.sort_by(|a, b| a.0.cmp(&b.0));
        items.into_iter().map(|(_, k, c)| (k, c)).collect()
    }
}

impl<T: Eq + Hash> PartialEq for MultiSet<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.counts
            .iter()
            .filter(|(_, c)| **c != 0)
            .all(|(k, c)| other.count(k) == *c)
    }
}

impl<T: Eq + Hash> Eq for MultiSet<T> {}

impl<T: Eq + Hash + SortKey> Hash for MultiSet<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Hash in canonical order so construction order is irrelevant.
        let items = self.sorted_items();
        items.len().hash(state);
        for (item, count) in items {
            item.hash(state);
            count.hash(state);
        }
    }
}

impl<T: Eq + Hash> FromIterator<(T, i64)> for MultiSet<T> {
    fn from_iter<I: IntoIterator<Item = (T, i64)>>(iter: I) -> Self {
        let mut set = MultiSet::new();
        set.add_many(iter);
        set
    }
}

impl<T: Eq + Hash> Extend<(T, i64)> for MultiSet<T> {
    fn extend<I: IntoIterator<Item = (T, i64)>>(&mut self, iter: I) {
        self.add_many(iter);
    }
}

impl<T: Eq + Hash + SortKey + fmt::Display> fmt::Display for MultiSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (item, count)) in self.sorted_items().into_iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            if count == 1 {
                write!(f, "{}", item)?;
            } else {
                write!(f, "{}^{}", item, count)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    impl SortKey for &'static str {
        type Key = &'static str;

        fn sort_key(&self) -> &'static str {
            *self
        }
    }

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_add_prunes_zero_entries() {
        let mut set = MultiSet::new();
        set.add("a", 2);
        set.add("a", -2);
        assert_eq!(set.len(), 0);
        set.add("b", 0);
        assert_eq!(set.len(), 0);
        assert_eq!(set.count(&"b"), 0);
    }

    #[test]
    fn test_unpruned_adds_need_clear() {
        let mut set = MultiSet::new();
        set.add_unpruned("a", 1);
        set.add_unpruned("a", -1);
        set.add_unpruned("b", 3);
        // Zero entries already count as absent.
        assert_eq!(set.len(), 1);
        assert_eq!(set, MultiSet::from_iter([("b", 3)]));
        set.clear_zero_count_items();
        assert_eq!(set.len(), 1);
        assert_eq!(set.count(&"b"), 3);
    }

    #[test]
    fn test_len_and_is_empty_agree_on_zero_entries() {
        let mut set = MultiSet::new();
        set.add_unpruned("x", 0);
        assert_eq!(set.len(), 0);
        assert!(set.is_empty());
        set.add_unpruned("y", 2);
        assert_eq!(set.len(), 1);
        assert!(!set.is_empty());
        set.add_unpruned("y", -2);
        assert_eq!(set.len(), 0);
        assert!(set.is_empty());
    }

    #[test]
    fn test_equality_ignores_insertion_order_and_splitting() {
        let mut once = MultiSet::new();
        once.add("x", 2);
        once.add("y", -1);

        let mut split = MultiSet::new();
        split.add("y", -1);
        split.add("x", 1);
        split.add("x", 1);

        assert_eq!(once, split);
        assert_eq!(hash_of(&once), hash_of(&split));

        split.add("x", 1);
        assert_ne!(once, split);
    }

    #[test]
    fn test_sorted_items_and_display() {
        let set: MultiSet<&str> = [("b", 1), ("a", 3), ("c", 0)].into_iter().collect();
        assert_eq!(set.sorted_items(), vec![(&"a", 3), (&"b", 1)]);
        assert_eq!(set.to_string(), "a^3 b");
    }
}
