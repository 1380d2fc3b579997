use core::cmp::{max, min};
use core::fmt;

use crate::error::{Error, Result};
use crate::tree::NodeId;

/// An inclusive interval `[from, to]` of element indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    from: u32,
    to: u32,
}

impl Range {
    pub fn new(from: u32, to: u32) -> Result<Self> {
        if from > to {
            return Err(Error::InvalidPath(format!("[{}-{}]", from, to)));
        }
        Ok(Self { from, to })
    }

    /// A range covering exactly one element.
    pub fn single(idx: u32) -> Self {
        Self { from: idx, to: idx }
    }

    /// The range covering all elements of an array with `nelms` elements.
    pub(crate) fn full(nelms: u32) -> Self {
        Self {
            from: 0,
            to: nelms.saturating_sub(1),
        }
    }

    #[inline]
    pub fn from(&self) -> u32 {
        self.from
    }

    #[inline]
    pub fn to(&self) -> u32 {
        self.to
    }

    /// Number of elements covered; never zero.
    #[inline]
    pub fn len(&self) -> u32 {
        self.to - self.from + 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, idx: u32) -> bool {
        self.from <= idx && idx <= self.to
    }

    /// The indices shared by both ranges, if any.
    pub fn overlap(&self, other: &Range) -> Option<Range> {
        let from = max(self.from, other.from);
        let to = min(self.to, other.to);
        if from <= to {
            Some(Range { from, to })
        } else {
            None
        }
    }

    /// True if this range addresses every element of an array with `nelms` elements.
    pub(crate) fn is_full(&self, nelms: u32) -> bool {
        *self == Range::full(nelms)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}-{}]", self.from, self.to)
    }
}

/// One step of a [`Path`](super::Path): a node plus, on the terminal segment only, an
/// optional restriction of its elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Segment {
    pub(crate) node: NodeId,
    pub(crate) range: Option<Range>,
}

impl Segment {
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The explicit range, `None` when all elements are addressed.
    pub fn range(&self) -> Option<Range> {
        self.range
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_is_symmetric() {
        let a = Range::new(0, 2047).unwrap();
        let b = Range::new(10, 20).unwrap();
        let c = Range::new(21, 30).unwrap();
        assert_eq!(a.overlap(&b), Some(b));
        assert_eq!(b.overlap(&a), Some(b));
        assert_eq!(b.overlap(&c), None);
        assert_eq!(c.overlap(&b), None);
        assert_eq!(Range::new(20, 25).unwrap().overlap(&b), Some(Range::single(20)));
    }

    #[test]
    fn lengths() {
        assert_eq!(Range::single(7).len(), 1);
        assert_eq!(Range::full(2048).len(), 2048);
        assert!(Range::full(16).is_full(16));
        assert!(!Range::new(1, 15).unwrap().is_full(16));
        assert!(Range::new(3, 2).is_err());
        assert_eq!(Range::new(10, 20).unwrap().to_string(), "[10-20]");
    }
}
