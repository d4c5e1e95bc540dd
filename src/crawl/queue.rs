// src/crawl/queue.rs
// =============================================================================
// This module holds the links waiting to be crawled.
//
// Two modes:
// - Unordered (production): a stack. Which link comes out next is not
//   promised, which is fine because every link gets visited anyway
// - Ordered (tests): a FIFO queue, so traversal is repeatable and a test can
//   predict exactly which pages were seen before the crawl stopped
//
// Both modes refuse duplicates, so a link is pending at most once.
//
// Rust concepts:
// - HashSet: O(1) membership checks
// - Vec: O(1) push/pop at the end
// - VecDeque: Double-ended queue for breadth-first order
// - Enums with data: One type, two storage strategies
// =============================================================================

use std::collections::{HashSet, VecDeque};

#[derive(Debug, Clone)]
pub enum Frontier {
    Unordered {
        stack: Vec<String>,
        members: HashSet<String>,
    },
    Ordered {
        queue: VecDeque<String>,
        members: HashSet<String>,
    },
}

impl Frontier {
    pub fn new(ordered: bool) -> Self {
        if ordered {
            Frontier::Ordered {
                queue: VecDeque::new(),
                members: HashSet::new(),
            }
        } else {
            Frontier::Unordered {
                stack: Vec::new(),
                members: HashSet::new(),
            }
        }
    }

    // Adds a link; returns false if it was already pending
    pub fn push(&mut self, link: String) -> bool {
        match self {
            Frontier::Unordered { stack, members } => {
                if members.insert(link.clone()) {
                    stack.push(link);
                    true
                } else {
                    false
                }
            }
            Frontier::Ordered { queue, members } => {
                if members.insert(link.clone()) {
                    queue.push_back(link);
                    true
                } else {
                    false
                }
            }
        }
    }

    // Removes one link
    pub fn pop(&mut self) -> Option<String> {
        match self {
            Frontier::Unordered { stack, members } => {
                let link = stack.pop()?;
                members.remove(&link);
                Some(link)
            }
            Frontier::Ordered { queue, members } => {
                let link = queue.pop_front()?;
                members.remove(&link);
                Some(link)
            }
        }
    }

    pub fn contains(&self, link: &str) -> bool {
        match self {
            Frontier::Unordered { members, .. } | Frontier::Ordered { members, .. } => {
                members.contains(link)
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Frontier::Unordered { members, .. } | Frontier::Ordered { members, .. } => {
                members.len()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Empties the frontier, returning whatever was left
    pub fn drain(&mut self) -> Vec<String> {
        let mut rest = Vec::with_capacity(self.len());
        while let Some(link) = self.pop() {
            rest.push(link);
        }
        rest
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why does each mode keep a list and a HashSet?
//    - The Vec/VecDeque hands out links in O(1) but checking membership is O(n)
//    - HashSet answers "already pending?" in O(1)
//    - Keeping both costs a clone per link and saves a scan per push
//
// 2. What does the `?` do in `stack.pop()?`
//    - In a function returning Option, `?` returns None early
//    - So an empty set makes pop() return None
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_is_fifo() {
        let mut frontier = Frontier::new(true);
        frontier.push("a".to_string());
        frontier.push("b".to_string());
        frontier.push("c".to_string());
        assert_eq!(frontier.pop().as_deref(), Some("a"));
        assert_eq!(frontier.pop().as_deref(), Some("b"));
        assert_eq!(frontier.len(), 1);
    }

    #[test]
    fn test_duplicates_are_refused() {
        for ordered in [true, false] {
            let mut frontier = Frontier::new(ordered);
            assert!(frontier.push("https://example.com/".to_string()));
            assert!(!frontier.push("https://example.com/".to_string()));
            assert_eq!(frontier.len(), 1);
            assert!(frontier.contains("https://example.com/"));
        }
    }

    #[test]
    fn test_unordered_pops_everything() {
        let mut frontier = Frontier::new(false);
        for link in ["x", "y", "z"] {
            frontier.push(link.to_string());
        }
        let mut rest = frontier.drain();
        rest.sort();
        assert_eq!(rest, vec!["x", "y", "z"]);
        assert!(frontier.is_empty());
        assert_eq!(frontier.pop(), None);
    }

    #[test]
    fn test_large_unordered_drain() {
        let mut frontier = Frontier::new(false);
        for i in 0..200_000 {
            frontier.push(format!("https://example.com/page-{}", i));
        }

        let mut popped = 0;
        while frontier.pop().is_some() {
            popped += 1;
        }

        assert_eq!(popped, 200_000);
        assert!(frontier.is_empty());
        assert!(!frontier.contains("https://example.com/page-7"));
    }

    #[test]
    fn test_popped_link_can_return() {
        let mut frontier = Frontier::new(true);
        frontier.push("a".to_string());
        frontier.pop();
        assert!(!frontier.contains("a"));
        assert!(frontier.push("a".to_string()));
    }
}
