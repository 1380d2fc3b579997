use core::fmt;
use std::sync::Arc;

use fallible_iterator::FallibleIterator;
use tracing::trace;

use super::parse::SpecIter;
use super::segment::{Range, Segment};
use crate::error::{Error, Result};
use crate::tree::{DeviceTree, NodeId, NodeRef};

/// A route from an origin node down through the tree.
///
/// A path references the shared [`DeviceTree`] but owns none of its nodes; cloning a
/// path copies the segment list only. The terminal segment may restrict the elements it
/// addresses with a [`Range`].
///
/// Every query and mutator that is not a range query is a harmless no-op on an empty
/// path.
#[derive(Clone)]
pub struct Path {
    pub(super) tree: Arc<DeviceTree>,
    pub(super) origin: NodeId,
    pub(super) segments: Vec<Segment>,
}

/// The node at the end of a path, or a sentinel for an empty path.
#[derive(Debug, Clone, Copy)]
pub struct Tail<'p>(Option<NodeRef<'p>>);

impl<'p> Tail<'p> {
    /// The node's name; the sentinel's name is empty.
    pub fn name(&self) -> &'p str {
        self.0.map_or("", |n| n.name())
    }

    pub fn node(&self) -> Option<NodeRef<'p>> {
        self.0
    }

    pub fn is_sentinel(&self) -> bool {
        self.0.is_none()
    }

    /// Element count of the node; 1 for the sentinel.
    pub fn nelms(&self) -> u32 {
        self.0.map_or(1, |n| n.nelms())
    }
}

impl Path {
    /// An empty, absolute path anchored at the root of `tree`.
    pub fn new(tree: &Arc<DeviceTree>) -> Self {
        Self {
            tree: Arc::clone(tree),
            origin: tree.root_id(),
            segments: Vec::new(),
        }
    }

    /// An empty path anchored at `origin`. Lookups on it resolve relative to that node.
    pub fn relative(tree: &Arc<DeviceTree>, origin: NodeId) -> Result<Self> {
        if tree.node(origin).is_none() {
            return Err(Error::InvalidPath(format!("{:?} not in tree", origin)));
        }
        Ok(Self {
            tree: Arc::clone(tree),
            origin,
            segments: Vec::new(),
        })
    }

    pub fn tree(&self) -> &Arc<DeviceTree> {
        &self.tree
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments, i.e. the depth reached below the origin.
    #[inline]
    pub fn size(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Reset to the empty path (keeping the origin).
    pub fn clear(&mut self) {
        self.segments.clear();
    }

    /// Strip the terminal segment and return the node it referenced.
    ///
    /// Does nothing and returns `None` on an empty path.
    pub fn up(&mut self) -> Option<NodeRef<'_>> {
        let seg = self.segments.pop()?;
        Some(NodeRef::new(&self.tree, seg.node))
    }

    /// A copy of this path with the terminal segment removed.
    #[must_use]
    pub fn parent(&self) -> Path {
        let mut parent = self.clone();
        parent.up();
        parent
    }

    /// The node referenced by the terminal segment.
    pub fn tail(&self) -> Tail<'_> {
        Tail(self.segments.last().map(|s| NodeRef::new(&self.tree, s.node)))
    }

    /// The empty path anchored where this one starts.
    #[must_use]
    pub fn origin(&self) -> Path {
        Self {
            tree: Arc::clone(&self.tree),
            origin: self.origin,
            segments: Vec::new(),
        }
    }

    pub fn origin_node(&self) -> NodeRef<'_> {
        NodeRef::new(&self.tree, self.origin)
    }

    /// The node new segments are attached to: the terminal node, or the origin if empty.
    pub(crate) fn anchor(&self) -> NodeId {
        self.segments.last().map_or(self.origin, |s| s.node)
    }

    /// Number of scalar elements addressed by the terminal segment; 1 for an empty path.
    pub fn nelms(&self) -> u32 {
        match self.segments.last() {
            None => 1,
            Some(seg) => seg
                .range
                .map_or_else(|| self.tree.data(seg.node).nelms, |r| r.len()),
        }
    }

    /// The effective range of the terminal segment.
    pub fn tail_range(&self) -> Result<Range> {
        let seg = self
            .segments
            .last()
            .ok_or_else(|| Error::InvalidPath("empty path has no tail".into()))?;
        Ok(seg
            .range
            .unwrap_or_else(|| Range::full(self.tree.data(seg.node).nelms)))
    }

    pub fn tail_from(&self) -> Result<u32> {
        self.tail_range().map(|r| r.from())
    }

    pub fn tail_to(&self) -> Result<u32> {
        self.tail_range().map(|r| r.to())
    }

    /// A copy of this path with the terminal segment restricted to `range`.
    pub fn with_range(&self, range: Range) -> Result<Path> {
        let mut this = self.clone();
        let nelms = this.tail().nelms();
        let seg = this
            .segments
            .last_mut()
            .ok_or_else(|| Error::InvalidPath("empty path has no tail".into()))?;
        if range.to() >= nelms {
            return Err(Error::InvalidPath(format!("{}{}", self, range)));
        }
        seg.range = Some(range).filter(|r| !r.is_full(nelms));
        Ok(this)
    }

    /// Attach `node` (a child of the current anchor) as the new terminal segment.
    ///
    /// Only the terminal segment carries a range; the range of the previous terminal is
    /// taken off and returned.
    pub(crate) fn push_segment(&mut self, node: NodeId, range: Option<Range>) -> Option<Range> {
        let nelms = self.tree.data(node).nelms;
        let prev = self.segments.last_mut().and_then(|s| s.range.take());
        self.segments.push(Segment {
            node,
            range: range.filter(|r| !r.is_full(nelms)),
        });
        prev
    }

    /// Undo [`Path::push_segment`].
    pub(crate) fn pop_segment(&mut self, restore: Option<Range>) {
        self.segments.pop();
        if let Some(last) = self.segments.last_mut() {
            last.range = restore;
        }
    }

    /// Resolve `spec` below the terminal node (or below the origin if this path is
    /// empty) and return the extended path.
    ///
    /// Fails with [`Error::NotFound`] if a component names no child and with
    /// [`Error::InvalidPath`] if a selector is malformed, exceeds the element count or
    /// narrows a component other than the last one.
    pub fn find_by_name(&self, spec: &str) -> Result<Path> {
        let mut found = self.clone();
        let mut iter = SpecIter::new(spec);
        let mut narrowed: Option<&str> = None;

        while let Some(comp) = iter.next()? {
            if let Some(prev) = narrowed {
                return Err(Error::InvalidPath(format!(
                    "{}: only the last component may select elements, not '{}'",
                    spec, prev
                )));
            }
            let here = NodeRef::new(&self.tree, found.anchor());
            let child = here
                .child(comp.name)
                .ok_or_else(|| Error::NotFound(comp.name.into()))?;

            if let Some(range) = comp.range {
                if range.to() >= child.nelms() {
                    return Err(Error::InvalidPath(format!(
                        "{}{} exceeds {} elements",
                        comp.name,
                        range,
                        child.nelms()
                    )));
                }
            }
            let id = child.id();
            found.push_segment(id, comp.range);
            if found.segments.last().map_or(false, |s| s.range.is_some()) {
                narrowed = Some(comp.name);
            }
        }

        trace!(from = %self, spec, found = %found, "resolved");
        Ok(found)
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.tree, &other.tree)
            && self.origin == other.origin
            && self.segments == other.segments
    }
}

impl Eq for Path {}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for seg in &self.segments {
            write!(f, "/{}", self.tree.data(seg.node).name)?;
        }
        if let Some(range) = self.segments.last().and_then(|s| s.range) {
            write!(f, "{}", range)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Path")
            .field("origin", &self.origin_node().name())
            .field("path", &self.to_string())
            .finish()
    }
}
