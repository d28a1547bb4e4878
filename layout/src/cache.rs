use std::collections::VecDeque;
use std::sync::Arc;

/// Bounded LRU of finished layouts keyed by view fingerprint.
///
/// Front of the queue is the most recently used entry.
#[derive(Debug, Clone)]
pub struct LayoutCache<T> {
    max_entries: usize,
    entries: VecDeque<(String, Arc<T>)>,
}

impl<T> LayoutCache<T> {
    /// `max_entries == 0` disables caching.
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries,
            entries: VecDeque::new(),
        }
    }

    pub fn lookup(&mut self, fingerprint: &str) -> Option<Arc<T>> {
        let idx = self
            .entries
            .iter()
            .position(|(key, _)| key == fingerprint)?;
        let entry = self.entries.remove(idx)?;
        let value = entry.1.clone();
        self.entries.push_front(entry);
        Some(value)
    }

    pub fn insert(&mut self, fingerprint: String, value: Arc<T>) {
        if self.max_entries == 0 {
            return;
        }
        self.entries.retain(|(key, _)| *key != fingerprint);
        self.entries.push_front((fingerprint, value));
        while self.entries.len() > self.max_entries {
            self.entries.pop_back();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = LayoutCache::new(2);
        cache.insert("a".into(), Arc::new(1));
        cache.insert("b".into(), Arc::new(2));
        assert_eq!(cache.lookup("a").as_deref(), Some(&1));

        cache.insert("c".into(), Arc::new(3));
        assert!(cache.lookup("b").is_none());
        assert!(cache.lookup("a").is_some());
        assert!(cache.lookup("c").is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn zero_capacity_never_stores() {
        let mut cache = LayoutCache::new(0);
        cache.insert("a".into(), Arc::new(1));
        assert!(cache.is_empty());
        assert!(cache.lookup("a").is_none());
    }
}
