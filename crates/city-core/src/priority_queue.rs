//! Array-backed binary min-heap keyed by an `f64` priority.
//!
//! Uses 0-indexed storage with parent = (i-1)/2, children = 2i+1, 2i+2.
//! Identifiers are advisory: membership and decrease-priority find the first
//! matching entry by linear scan, and nothing prevents duplicates.
//!
//! Priorities are ordered with [`f64::total_cmp`], so a NaN priority sorts
//! after every finite one. Equal priorities leave in insertion order.

use crate::error::{CoreError, Result};

/// An entry in the priority queue.
#[derive(Debug, Clone, PartialEq)]
pub struct HeapEntry<T> {
    pub id: String,
    pub priority: f64,
    pub payload: T,
}

#[derive(Debug, Clone)]
struct HeapNode<T> {
    seq: u64,
    entry: HeapEntry<T>,
}

impl<T> HeapNode<T> {
    fn precedes(&self, other: &Self) -> bool {
        self.entry
            .priority
            .total_cmp(&other.entry.priority)
            .then(self.seq.cmp(&other.seq))
            .is_lt()
    }
}

/// A min-heap that yields the lowest priority value first.
#[derive(Debug, Clone)]
pub struct PriorityQueue<T> {
    nodes: Vec<HeapNode<T>>,
    next_seq: u64,
}

impl<T> PriorityQueue<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Push an entry and restore the heap property upward.
    pub fn insert(&mut self, id: impl Into<String>, priority: f64, payload: T) {
        self.nodes.push(HeapNode {
            seq: self.next_seq,
            entry: HeapEntry {
                id: id.into(),
                priority,
                payload,
            },
        });
        self.next_seq += 1;
        self.sift_up(self.nodes.len() - 1);
    }

    /// Remove and return the entry with the smallest priority.
    pub fn extract_min(&mut self) -> Option<HeapEntry<T>> {
        if self.nodes.is_empty() {
            return None;
        }
        let last = self.nodes.len() - 1;
        self.nodes.swap(0, last);
        let min = self.nodes.pop();
        if !self.nodes.is_empty() {
            self.sift_down(0);
        }
        min.map(|node| node.entry)
    }

    pub fn peek_min(&self) -> Option<&HeapEntry<T>> {
        self.nodes.first().map(|node| &node.entry)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|node| node.entry.id == id)
    }

    /// Lower the priority of the first entry named `id`.
    ///
    /// A request that does not strictly lower the priority is rejected with
    /// `InvalidArgument` and leaves the heap untouched.
    pub fn decrease_priority(&mut self, id: &str, new_priority: f64) -> Result<()> {
        let pos = self
            .nodes
            .iter()
            .position(|node| node.entry.id == id)
            .ok_or_else(|| CoreError::NotFound {
                what: "queue entry",
                id: id.to_string(),
            })?;
        let current = self.nodes[pos].entry.priority;
        if new_priority.is_nan() || new_priority >= current {
            return Err(CoreError::InvalidArgument(format!(
                "priority {new_priority} for {id} is not lower than {current}"
            )));
        }
        self.nodes[pos].entry.priority = new_priority;
        self.sift_up(pos);
        Ok(())
    }

    /// Entries in heap-array order (only the first is guaranteed minimal).
    pub fn iter(&self) -> impl Iterator<Item = &HeapEntry<T>> {
        self.nodes.iter().map(|node| &node.entry)
    }

    /// Drain the queue into a vector of ascending priority.
    pub fn into_sorted_vec(mut self) -> Vec<HeapEntry<T>> {
        let mut sorted = Vec::with_capacity(self.nodes.len());
        while let Some(entry) = self.extract_min() {
            sorted.push(entry);
        }
        sorted
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.nodes[pos].precedes(&self.nodes[parent]) {
                self.nodes.swap(pos, parent);
                pos = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.nodes.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut smallest = pos;

            if left < len && self.nodes[left].precedes(&self.nodes[smallest]) {
                smallest = left;
            }
            if right < len && self.nodes[right].precedes(&self.nodes[smallest]) {
                smallest = right;
            }
            if smallest == pos {
                break;
            }
            self.nodes.swap(pos, smallest);
            pos = smallest;
        }
    }
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_heap<T>(pq: &PriorityQueue<T>) -> bool {
        (1..pq.nodes.len()).all(|i| !pq.nodes[i].precedes(&pq.nodes[(i - 1) / 2]))
    }

    #[test]
    fn test_empty() {
        let mut pq: PriorityQueue<()> = PriorityQueue::new();
        assert!(pq.is_empty());
        assert!(pq.peek_min().is_none());
        assert!(pq.extract_min().is_none());
    }

    #[test]
    fn test_extract_order_scenario() {
        let mut pq = PriorityQueue::new();
        pq.insert("x", 5.0, ());
        pq.insert("y", 1.0, ());
        pq.insert("z", 3.0, ());

        let order: Vec<String> = std::iter::from_fn(|| pq.extract_min())
            .map(|e| e.id)
            .collect();
        assert_eq!(order, vec!["y", "z", "x"]);
    }

    #[test]
    fn test_peek_does_not_mutate() {
        let mut pq = PriorityQueue::new();
        pq.insert("a", 2.0, "payload-a");
        pq.insert("b", 0.5, "payload-b");
        assert_eq!(pq.peek_min().unwrap().payload, "payload-b");
        assert_eq!(pq.len(), 2);
    }

    #[test]
    fn test_non_decreasing_extraction() {
        let mut pq = PriorityQueue::with_capacity(2);
        // Deterministic pseudo-random priorities.
        let mut seed: u64 = 0x2545_f491;
        for i in 0..200 {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            let priority = (seed >> 33) as f64 / 1_000.0;
            pq.insert(format!("e{i}"), priority, i);
            if i % 7 == 0 {
                pq.extract_min();
            }
            assert!(is_heap(&pq));
        }
        let mut last = f64::NEG_INFINITY;
        while let Some(entry) = pq.extract_min() {
            assert!(entry.priority >= last);
            last = entry.priority;
        }
    }

    #[test]
    fn test_decrease_priority_moves_to_root() {
        let mut pq = PriorityQueue::new();
        pq.insert("ambulance", 4.0, ());
        pq.insert("fire", 2.0, ());
        pq.insert("police", 3.0, ());

        pq.decrease_priority("ambulance", 1.0).unwrap();
        assert_eq!(pq.peek_min().unwrap().id, "ambulance");
        assert!(is_heap(&pq));
    }

    #[test]
    fn test_decrease_priority_rejections() {
        let mut pq = PriorityQueue::new();
        pq.insert("a", 2.0, ());

        assert!(matches!(
            pq.decrease_priority("a", 2.0),
            Err(CoreError::InvalidArgument(_))
        ));
        assert!(matches!(
            pq.decrease_priority("a", 3.0),
            Err(CoreError::InvalidArgument(_))
        ));
        assert!(matches!(
            pq.decrease_priority("missing", 0.0),
            Err(CoreError::NotFound { .. })
        ));
        assert_eq!(pq.peek_min().unwrap().priority, 2.0);
    }

    #[test]
    fn test_contains() {
        let mut pq = PriorityQueue::new();
        pq.insert("a", 1.0, ());
        assert!(pq.contains("a"));
        assert!(!pq.contains("b"));
        pq.extract_min();
        assert!(!pq.contains("a"));
    }

    #[test]
    fn test_into_sorted_vec() {
        let mut pq = PriorityQueue::new();
        for (id, p) in [("c", 3.0), ("a", 1.0), ("d", 4.0), ("b", 2.0)] {
            pq.insert(id, p, ());
        }
        let ids: Vec<String> = pq.into_sorted_vec().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_nan_priorities_sort_last() {
        let mut pq = PriorityQueue::new();
        pq.insert("a", 5.0, ());
        pq.insert("b", f64::NAN, ());
        pq.insert("c", 1.0, ());
        pq.insert("d", 0.0, ());
        pq.insert("e", f64::NAN, ());
        pq.insert("f", -2.0, ());
        assert!(is_heap(&pq));

        let drained: Vec<HeapEntry<()>> = std::iter::from_fn(|| pq.extract_min()).collect();
        let ids: Vec<&str> = drained.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["f", "d", "c", "a", "b", "e"]);
        let finite: Vec<f64> = drained
            .iter()
            .map(|e| e.priority)
            .filter(|p| !p.is_nan())
            .collect();
        assert!(finite.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_equal_priorities_keep_insertion_order() {
        let mut pq = PriorityQueue::new();
        for id in ["first", "second", "third", "fourth", "fifth"] {
            pq.insert(id, 1.0, ());
        }
        pq.insert("urgent", 0.5, ());
        let ids: Vec<String> = pq.into_sorted_vec().into_iter().map(|e| e.id).collect();
        assert_eq!(
            ids,
            vec!["urgent", "first", "second", "third", "fourth", "fifth"]
        );
    }
}
