use std::collections::HashMap;

/// Side-table of discovered elements, keyed by the driver's per-element key.
///
/// Lives inside a single run's `CrawlState`; a fresh run starts empty.
#[derive(Debug, Clone, Default)]
pub struct StampStore {
    marks: HashMap<String, usize>,
}

impl StampStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` as discovered at `depth`. Re-stamping keeps the first depth
    /// and returns it.
    pub fn stamp(&mut self, key: &str, depth: usize) -> usize {
        *self.marks.entry(key.to_string()).or_insert(depth)
    }

    pub fn is_stamped(&self, key: &str) -> bool {
        self.marks.contains_key(key)
    }

    pub fn depth_of(&self, key: &str) -> Option<usize> {
        self.marks.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}
