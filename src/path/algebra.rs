//! Composition and comparison of paths.

use std::sync::Arc;

use super::path::Path;
use crate::error::{Error, Result};

impl Path {
    #[inline]
    fn same_tree(&self, other: &Path) -> bool {
        Arc::ptr_eq(&self.tree, &other.tree)
    }

    /// True if `other` starts where this path ends, i.e. `other`'s origin is this path's
    /// terminal node (or this path's origin when it is empty).
    pub fn is_continued_by(&self, other: &Path) -> bool {
        self.same_tree(other) && self.anchor() == other.origin
    }

    /// True if both paths end in the same node, regardless of their ranges.
    pub fn verify_at_tail(&self, other: &Path) -> bool {
        match (self.segments.last(), other.segments.last()) {
            (Some(a), Some(b)) => self.same_tree(other) && a.node == b.node,
            _ => false,
        }
    }

    /// Returns a new path made of this path's segments followed by `other`'s.
    ///
    /// `other` must start at this path's terminal node, otherwise
    /// [`Error::InvalidPath`] is returned. If this path is empty the result is a copy
    /// of `other`. The range of this path's terminal segment does not survive when
    /// `other` contributes segments.
    pub fn concat(&self, other: &Path) -> Result<Path> {
        let mut joined = self.clone();
        joined.append(other)?;
        Ok(joined)
    }

    /// In-place form of [`Path::concat`].
    pub fn append(&mut self, other: &Path) -> Result<()> {
        if self.is_empty() && self.same_tree(other) {
            self.origin = other.origin;
            self.segments.clone_from(&other.segments);
            return Ok(());
        }
        if !self.is_continued_by(other) {
            return Err(Error::InvalidPath(format!(
                "'{}' does not continue '{}'",
                other, self
            )));
        }
        for seg in &other.segments {
            self.push_segment(seg.node, seg.range);
        }
        Ok(())
    }

    /// True if both paths end in the same node and their element ranges share at least
    /// one index. Always false if either path is empty.
    pub fn is_intersecting(&self, other: &Path) -> bool {
        if !self.verify_at_tail(other) {
            return false;
        }
        match (self.tail_range(), other.tail_range()) {
            (Ok(a), Ok(b)) => a.overlap(&b).is_some(),
            _ => false,
        }
    }

    /// Returns a copy of this path whose terminal range is the overlap of both paths'
    /// terminal ranges.
    ///
    /// An empty path intersects to itself. Otherwise the paths must satisfy
    /// [`Path::is_intersecting`] or [`Error::InvalidPath`] is returned.
    pub fn intersect(&self, other: &Path) -> Result<Path> {
        if self.is_empty() {
            return Ok(self.clone());
        }
        let not_intersecting =
            || Error::InvalidPath(format!("'{}' and '{}' do not intersect", self, other));
        if !self.verify_at_tail(other) {
            return Err(not_intersecting());
        }
        let overlap = self
            .tail_range()?
            .overlap(&other.tail_range()?)
            .ok_or_else(not_intersecting)?;
        self.with_range(overlap)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::defs::WordSize;
    use crate::error::Error;
    use crate::path::{Path, Range};
    use crate::tree::{DeviceTree, FieldInfo, NodeSpec, TreeBuilder};

    fn tree() -> Arc<DeviceTree> {
        let mut b = TreeBuilder::new();
        b.begin_node(NodeSpec::hub("root")).unwrap();
        b.begin_node(NodeSpec::hub("MMIO")).unwrap();
        b.begin_node(NodeSpec::hub("srvm")).unwrap();
        b.add_node(NodeSpec::field("arr", FieldInfo::default()).nelms(2048))
            .unwrap();
        b.add_node(NodeSpec::field("other", FieldInfo {
            word: WordSize::U8,
            ..FieldInfo::default()
        }))
        .unwrap();
        b.end_node().unwrap();
        b.end_node().unwrap();
        b.end_node().unwrap();
        b.build().unwrap()
    }

    #[test]
    fn concat_requires_continuation() {
        let tree = tree();
        let arr = Path::new(&tree).find_by_name("MMIO/srvm/arr").unwrap();
        let srvm = arr.parent();
        let srvm_node = srvm.tail().node().unwrap().id();
        let rel = Path::relative(&tree, srvm_node)
            .unwrap()
            .find_by_name("arr")
            .unwrap();

        assert!(srvm.is_continued_by(&rel));
        assert!(!arr.is_continued_by(&rel));
        assert_eq!(srvm.concat(&rel).unwrap().to_string(), arr.to_string());
        assert_eq!(srvm.concat(&rel).unwrap(), arr);

        let mut s = srvm.clone();
        assert!(matches!(s.append(&arr), Err(Error::InvalidPath(_))));
        assert_eq!(s, srvm);
        s.append(&rel).unwrap();
        assert_eq!(s, arr);
    }

    #[test]
    fn concat_drops_interior_range() {
        let tree = tree();
        let root = Path::new(&tree);
        let mmio = root.find_by_name("MMIO").unwrap();
        let srvm_rel = Path::relative(&tree, mmio.tail().node().unwrap().id())
            .unwrap()
            .find_by_name("srvm")
            .unwrap();
        let joined = mmio.concat(&srvm_rel).unwrap();
        assert_eq!(joined.to_string(), "/MMIO/srvm");

        let arr = root.find_by_name("MMIO/srvm/arr[1-2]").unwrap();
        let rest = arr.origin();
        // An empty continuation keeps the terminal range.
        assert_eq!(root.concat(&rest).unwrap(), root);
        assert_eq!(arr.nelms(), 2);
    }

    #[test]
    fn empty_receiver_adopts_other() {
        let tree = tree();
        let empty = Path::new(&tree);
        let arr = empty.find_by_name("MMIO/srvm/arr").unwrap();
        assert_eq!(empty.concat(&empty).unwrap(), empty);
        assert_eq!(empty.concat(&arr).unwrap(), arr);
        assert_eq!(empty.intersect(&empty).unwrap(), empty);
        assert!(!empty.is_intersecting(&empty));
        assert!(!empty.verify_at_tail(&arr));
    }

    #[test]
    fn intersection() {
        let tree = tree();
        let root = Path::new(&tree);
        let a = root.find_by_name("MMIO/srvm/arr").unwrap();
        let b = root.find_by_name("MMIO/srvm/arr[10-20]").unwrap();
        let c = root.find_by_name("MMIO/srvm/arr[21-30]").unwrap();
        let other = root.find_by_name("MMIO/srvm/other").unwrap();

        assert!(a.verify_at_tail(&b));
        assert!(!a.verify_at_tail(&other));
        assert!(a.is_intersecting(&b) && b.is_intersecting(&a));
        assert!(!b.is_intersecting(&c) && !c.is_intersecting(&b));
        assert!(!a.is_intersecting(&other));

        let i = a.intersect(&b).unwrap();
        assert!(i.to_string().ends_with("[10-20]"));
        assert_eq!(i.tail_from().unwrap(), 10);
        assert_eq!(i.tail_to().unwrap(), 20);
        assert_eq!(i.nelms(), 11);

        assert_eq!(a.intersect(&a).unwrap(), a);
        assert!(matches!(b.intersect(&c), Err(Error::InvalidPath(_))));
        assert!(matches!(a.intersect(&root), Err(Error::InvalidPath(_))));

        let r = b
            .intersect(&a.with_range(Range::new(15, 100).unwrap()).unwrap())
            .unwrap();
        assert_eq!(r.to_string(), "/MMIO/srvm/arr[15-20]");
    }
}
