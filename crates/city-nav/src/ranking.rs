//! Score ranking and priority dispatch built on the min-heap.

use city_core::priority_queue::{HeapEntry, PriorityQueue};
use city_core::{CoreError, Result};
use serde::Serialize;

/// An item with the score it was ranked by.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<T> {
    pub id: String,
    pub score: f64,
    pub item: T,
}

/// The `n` highest-scoring items, best first.
///
/// Items with a NaN score cannot be ordered and are skipped.
pub fn top_n<T, S, I>(items: I, n: usize) -> Vec<Ranked<T>>
where
    S: Into<String>,
    I: IntoIterator<Item = (S, f64, T)>,
{
    let mut queue = PriorityQueue::new();
    for (id, score, item) in items {
        let id = id.into();
        if score.is_nan() {
            tracing::debug!(%id, "skipping unscored item");
            continue;
        }
        // Min-heap: negate so the best score surfaces first.
        queue.insert(id, -score, item);
    }

    std::iter::from_fn(|| queue.extract_min())
        .take(n)
        .map(|entry| Ranked {
            id: entry.id,
            score: -entry.priority,
            item: entry.payload,
        })
        .collect()
}

/// Drain requests in ascending priority (lower value is served first).
/// Equal priorities are served in submission order; NaN priorities go last.
pub fn dispatch_order<T, S, I>(requests: I) -> Vec<HeapEntry<T>>
where
    S: Into<String>,
    I: IntoIterator<Item = (S, f64, T)>,
{
    let mut queue = PriorityQueue::new();
    for (id, priority, payload) in requests {
        queue.insert(id, priority, payload);
    }
    queue.into_sorted_vec()
}

/// Emergency request queue with unique request IDs.
///
/// The underlying heap does not enforce identifier uniqueness, so submission
/// checks membership first.
#[derive(Debug, Default)]
pub struct DispatchQueue<T> {
    pending: PriorityQueue<T>,
}

impl<T> DispatchQueue<T> {
    pub fn new() -> Self {
        Self {
            pending: PriorityQueue::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn submit(&mut self, id: impl Into<String>, priority: f64, request: T) -> Result<()> {
        let id = id.into();
        if priority.is_nan() {
            return Err(CoreError::InvalidArgument(format!(
                "priority for {id} must be a number"
            )));
        }
        if self.pending.contains(&id) {
            return Err(CoreError::AlreadyExists { id });
        }
        self.pending.insert(id, priority, request);
        Ok(())
    }

    /// Move a pending request ahead by lowering its priority value.
    pub fn escalate(&mut self, id: &str, priority: f64) -> Result<()> {
        self.pending.decrease_priority(id, priority)?;
        tracing::debug!(id, priority, "request escalated");
        Ok(())
    }

    /// The request that would be served next.
    pub fn peek(&self) -> Option<&HeapEntry<T>> {
        self.pending.peek_min()
    }

    /// Remove and return the most urgent request.
    pub fn next_request(&mut self) -> Option<HeapEntry<T>> {
        self.pending.extract_min()
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_n_schools() {
        let schools = vec![
            ("school_a", 3.9, "Alpha"),
            ("school_b", 4.8, "Beta"),
            ("school_c", 4.1, "Gamma"),
            ("school_d", f64::NAN, "Unrated"),
            ("school_e", 2.0, "Epsilon"),
        ];
        let top = top_n(schools, 3);
        let ids: Vec<&str> = top.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["school_b", "school_c", "school_a"]);
        assert_eq!(top[0].score, 4.8);
        assert_eq!(top[0].item, "Beta");
    }

    #[test]
    fn test_top_n_more_than_available() {
        let top = top_n(vec![("x", 1.0, ())], 5);
        assert_eq!(top.len(), 1);
        assert!(top_n(Vec::<(String, f64, ())>::new(), 3).is_empty());
    }

    #[test]
    fn test_dispatch_order() {
        let order = dispatch_order(vec![("x", 5.0, ()), ("y", 1.0, ()), ("z", 3.0, ())]);
        let ids: Vec<&str> = order.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["y", "z", "x"]);
    }

    #[test]
    fn test_dispatch_order_unscored_and_ties() {
        let order = dispatch_order(vec![
            ("late", 2.0, ()),
            ("unknown", f64::NAN, ()),
            ("early", 1.0, ()),
            ("also-late", 2.0, ()),
            ("critical", 0.0, ()),
        ]);
        let ids: Vec<&str> = order.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["critical", "early", "late", "also-late", "unknown"]);
    }

    #[test]
    fn test_dispatch_queue_lifecycle() {
        let mut queue = DispatchQueue::new();
        queue.submit("fire-12", 3.0, "warehouse fire").unwrap();
        queue.submit("med-4", 2.0, "cardiac arrest").unwrap();
        queue.submit("pol-9", 5.0, "noise complaint").unwrap();

        assert_eq!(
            queue.submit("med-4", 1.0, "duplicate"),
            Err(CoreError::AlreadyExists { id: "med-4".into() })
        );
        assert_eq!(queue.len(), 3);

        queue.escalate("fire-12", 1.0).unwrap();
        assert_eq!(queue.peek().unwrap().id, "fire-12");
        assert!(matches!(
            queue.escalate("pol-9", 6.0),
            Err(CoreError::InvalidArgument(_))
        ));

        let served: Vec<String> = std::iter::from_fn(|| queue.next_request())
            .map(|e| e.id)
            .collect();
        assert_eq!(served, vec!["fire-12", "med-4", "pol-9"]);
        assert!(queue.is_empty());
        assert!(!queue.is_pending("fire-12"));
    }

    #[test]
    fn test_dispatch_queue_rejects_nan() {
        let mut queue: DispatchQueue<()> = DispatchQueue::new();
        assert!(matches!(
            queue.submit("bad", f64::NAN, ()),
            Err(CoreError::InvalidArgument(_))
        ));
    }
}
