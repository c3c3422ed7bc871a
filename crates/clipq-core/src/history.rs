use std::collections::VecDeque;
use std::fmt;

/// A clipboard operation observed through the keyboard hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Copy,
    Cut,
    Paste,
}

impl Op {
    pub fn tag(self) -> char {
        match self {
            Op::Copy => 'C',
            Op::Cut => 'X',
            Op::Paste => 'V',
        }
    }
}

/// Bounded record of recent operations, most recent first.
pub struct OpHistory {
    ops: VecDeque<Op>,
    limit: usize,
}

impl OpHistory {
    pub fn new(limit: usize) -> Self {
        OpHistory {
            ops: VecDeque::with_capacity(limit),
            limit,
        }
    }

    pub fn record(&mut self, op: Op) {
        if self.limit == 0 {
            return;
        }
        self.ops.push_front(op);
        self.ops.truncate(self.limit);
    }

    /// Most recent operation first.
    pub fn iter(&self) -> impl Iterator<Item = Op> + '_ {
        self.ops.iter().copied()
    }

    /// The tags as a string, most recent first.
    pub fn tags(&self) -> String {
        self.iter().map(Op::tag).collect()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl fmt::Display for OpHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tags())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_most_recent_first() {
        let mut h = OpHistory::new(20);
        h.record(Op::Copy);
        h.record(Op::Cut);
        h.record(Op::Paste);
        assert_eq!(h.tags(), "VXC");
    }

    #[test]
    fn test_capped() {
        let mut h = OpHistory::new(20);
        for _ in 0..25 {
            h.record(Op::Copy);
        }
        h.record(Op::Paste);
        assert_eq!(h.len(), 20);
        assert_eq!(h.iter().next(), Some(Op::Paste));
    }

    #[test]
    fn test_zero_limit_keeps_nothing() {
        let mut h = OpHistory::new(0);
        h.record(Op::Cut);
        assert!(h.is_empty());
        assert_eq!(h.to_string(), "");
    }
}
