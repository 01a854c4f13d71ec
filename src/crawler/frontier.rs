//! Crawl frontier
//!
//! A FIFO queue of `(url, depth)` entries. Popping from the front while
//! discovered links are pushed to the back yields breadth-first order, so
//! every page at depth `n` is attempted before any page at depth `n + 1`.

use std::collections::{HashSet, VecDeque};

/// A URL waiting to be attempted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// Normalized URL
    pub url: String,

    /// Link distance from the seed
    pub depth: u32,
}

/// Frontier queue bounded by a maximum depth
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,

    /// URLs currently waiting in `queue`
    queued: HashSet<String>,

    max_depth: u32,
}

impl Frontier {
    pub fn new(max_depth: u32) -> Self {
        Self {
            queue: VecDeque::new(),
            queued: HashSet::new(),
            max_depth,
        }
    }

    /// Adds a URL to the back of the queue
    ///
    /// # Returns
    ///
    /// `false` if the entry was refused because it is deeper than the
    /// maximum depth or already waiting in the queue
    pub fn push(&mut self, url: String, depth: u32) -> bool {
        if depth > self.max_depth {
            tracing::trace!("Not queueing {} at depth {}", url, depth);
            return false;
        }

        if !self.queued.insert(url.clone()) {
            return false;
        }

        self.queue.push_back(FrontierEntry { url, depth });
        true
    }

    /// Takes the oldest entry
    pub fn pop(&mut self) -> Option<FrontierEntry> {
        let entry = self.queue.pop_front()?;
        self.queued.remove(&entry.url);
        Some(entry)
    }

    /// Returns true if the URL is waiting in the queue
    pub fn contains(&self, url: &str) -> bool {
        self.queued.contains(url)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drops every waiting entry
    ///
    /// # Returns
    ///
    /// The number of entries discarded
    pub fn clear(&mut self) -> usize {
        let discarded = self.queue.len();
        self.queue.clear();
        self.queued.clear();
        discarded
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut frontier = Frontier::new(3);
        frontier.push("https://a.org/1".to_string(), 0);
        frontier.push("https://a.org/2".to_string(), 1);
        frontier.push("https://a.org/3".to_string(), 1);

        assert_eq!(frontier.pop().unwrap().url, "https://a.org/1");
        assert_eq!(frontier.pop().unwrap().url, "https://a.org/2");
        assert_eq!(frontier.pop().unwrap().url, "https://a.org/3");
        assert!(frontier.pop().is_none());
    }

    #[test]
    fn test_depth_limit_on_push() {
        let mut frontier = Frontier::new(1);
        assert!(frontier.push("https://a.org/1".to_string(), 1));
        assert!(!frontier.push("https://a.org/2".to_string(), 2));
        assert_eq!(frontier.len(), 1);
    }

    #[test]
    fn test_duplicates_refused_while_queued() {
        let mut frontier = Frontier::new(3);
        assert!(frontier.push("https://a.org/1".to_string(), 1));
        assert!(!frontier.push("https://a.org/1".to_string(), 2));
        assert!(frontier.contains("https://a.org/1"));
        assert_eq!(frontier.len(), 1);

        let entry = frontier.pop().unwrap();
        assert_eq!(entry.depth, 1);
        assert!(!frontier.contains("https://a.org/1"));
    }

    #[test]
    fn test_clear_reports_discarded() {
        let mut frontier = Frontier::new(3);
        frontier.push("https://a.org/1".to_string(), 0);
        frontier.push("https://a.org/2".to_string(), 0);

        assert_eq!(frontier.clear(), 2);
        assert!(frontier.is_empty());
        assert!(!frontier.contains("https://a.org/1"));
    }

    #[test]
    fn test_zero_depth_frontier_holds_seed_only() {
        let mut frontier = Frontier::new(0);
        assert!(frontier.push("https://a.org".to_string(), 0));
        assert!(!frontier.push("https://a.org/child".to_string(), 1));
        assert_eq!(frontier.max_depth(), 0);
    }
}
