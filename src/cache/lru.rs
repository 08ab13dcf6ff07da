// In-memory page cache.
// Fixed-capacity LRU keyed by URL, owned by a single agent session.

use std::collections::{HashMap, VecDeque};

/// Default number of pages kept per agent.
pub const DEFAULT_CAPACITY: usize = 16;

/// Least-recently-used cache of cleaned pages.
#[derive(Debug, Clone)]
pub struct PageCache {
    capacity: usize,
    entries: HashMap<String, String>,
    /// Front = least recently used.
    order: VecDeque<String>,
}

impl PageCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Look up a page and mark it most recently used.
    pub fn get(&mut self, url: &str) -> Option<&String> {
        if !self.entries.contains_key(url) {
            return None;
        }
        self.touch(url);
        self.entries.get(url)
    }

    /// Insert or replace a page, evicting the oldest entry when full.
    pub fn insert(&mut self, url: impl Into<String>, html: impl Into<String>) {
        let url = url.into();
        if self.entries.contains_key(&url) {
            self.touch(&url);
        } else {
            if self.entries.len() == self.capacity {
                if let Some(oldest) = self.order.pop_front() {
                    self.entries.remove(&oldest);
                }
            }
            self.order.push_back(url.clone());
        }
        self.entries.insert(url, html.into());
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn touch(&mut self, url: &str) {
        if let Some(pos) = self.order.iter().position(|u| u == url) {
            if let Some(key) = self.order.remove(pos) {
                self.order.push_back(key);
            }
        }
    }
}

impl Default for PageCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
