use std::collections::VecDeque;

/// FIFO of copied text snippets.
pub struct ClipQueue {
    items: VecDeque<String>,
    /// 0 means unbounded.
    limit: usize,
}

impl ClipQueue {
    pub fn new(limit: usize) -> Self {
        ClipQueue {
            items: VecDeque::new(),
            limit,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(0)
    }

    /// Append text at the back. Returns the oldest entry if the limit forced it out.
    pub fn push(&mut self, text: String) -> Option<String> {
        let dropped = if self.limit > 0 && self.items.len() >= self.limit {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(text);
        dropped
    }

    /// Remove and return the oldest entry.
    pub fn pop(&mut self) -> Option<String> {
        self.items.pop_front()
    }

    /// Put an entry back at the head, e.g. after a failed paste.
    pub fn requeue_front(&mut self, text: String) {
        self.items.push_front(text);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.items.iter().map(|s| s.as_str())
    }

    /// Iterate most recent first.
    pub fn iter_recent(&self) -> impl Iterator<Item = &str> {
        self.iter().rev()
    }
}
