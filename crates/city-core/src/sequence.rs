//! Auxiliary containers: an ordered singly linked list, a LIFO stack and a
//! FIFO queue.
//!
//! These back route waypoint lists, route history and passenger queues in
//! the collaborators.

use crate::error::{CoreError, Result};
use std::collections::VecDeque;

struct Node<T> {
    value: T,
    next: Option<Box<Node<T>>>,
}

/// Singly linked list preserving insertion order.
pub struct OrderedSequence<T> {
    head: Option<Box<Node<T>>>,
    len: usize,
}

impl<T> OrderedSequence<T> {
    pub fn new() -> Self {
        Self { head: None, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push_front(&mut self, value: T) {
        let next = self.head.take();
        self.head = Some(Box::new(Node { value, next }));
        self.len += 1;
    }

    pub fn push_back(&mut self, value: T) {
        let tail = self.link_at(self.len);
        *tail = Some(Box::new(Node { value, next: None }));
        self.len += 1;
    }

    /// Insert `value` so that it ends up at position `index` (`0..=len`).
    pub fn insert_at(&mut self, index: usize, value: T) -> Result<()> {
        if index > self.len {
            return Err(CoreError::InvalidArgument(format!(
                "insert position {index} beyond length {}",
                self.len
            )));
        }
        let cursor = self.link_at(index);
        let next = cursor.take();
        *cursor = Some(Box::new(Node { value, next }));
        self.len += 1;
        Ok(())
    }

    /// Unlink and return the element at `index`.
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        let cursor = self.link_at(index);
        let node = cursor.take()?;
        *cursor = node.next;
        self.len -= 1;
        Some(node.value)
    }

    pub fn pop_front(&mut self) -> Option<T> {
        self.remove_at(0)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.iter().nth(index)
    }

    pub fn front(&self) -> Option<&T> {
        self.head.as_ref().map(|n| &n.value)
    }

    /// Position of the first element matching `pred`.
    pub fn position(&self, pred: impl FnMut(&T) -> bool) -> Option<usize> {
        self.iter().position(pred)
    }

    pub fn clear(&mut self) {
        // Unlink iteratively so long lists do not recurse on drop.
        let mut cursor = self.head.take();
        while let Some(mut node) = cursor {
            cursor = node.next.take();
        }
        self.len = 0;
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            next: self.head.as_deref(),
        }
    }

    fn link_at(&mut self, index: usize) -> &mut Option<Box<Node<T>>> {
        let mut cursor = &mut self.head;
        for _ in 0..index {
            match cursor {
                Some(node) => cursor = &mut node.next,
                None => unreachable!("index checked against len"),
            }
        }
        cursor
    }
}

impl<T> Default for OrderedSequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for OrderedSequence<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for OrderedSequence<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> FromIterator<T> for OrderedSequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let items: Vec<T> = iter.into_iter().collect();
        let mut seq = Self::new();
        for value in items.into_iter().rev() {
            seq.push_front(value);
        }
        seq
    }
}

impl<'a, T> IntoIterator for &'a OrderedSequence<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Borrowing iterator over an [`OrderedSequence`].
pub struct Iter<'a, T> {
    next: Option<&'a Node<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.next.map(|node| {
            self.next = node.next.as_deref();
            &node.value
        })
    }
}

/// Last-in, first-out stack.
#[derive(Debug, Clone)]
pub struct Stack<T> {
    items: Vec<T>,
}

impl<T> Stack<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, value: T) {
        self.items.push(value);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    pub fn peek(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate from the top of the stack down.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter().rev()
    }
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// First-in, first-out queue.
#[derive(Debug, Clone)]
pub struct Queue<T> {
    items: VecDeque<T>,
}

impl<T> Queue<T> {
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    pub fn enqueue(&mut self, value: T) {
        self.items.push_back(value);
    }

    pub fn dequeue(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub fn front(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate from front to back.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}
