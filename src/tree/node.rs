use core::fmt;
use std::sync::Arc;

use super::enums::EnumMap;
use super::iters::{ChildIter, DfsIter};
use super::tree::{DeviceTree, NodeData};
use crate::defs::{ByteOrder, WordSize};
use crate::value::Transport;

/// Index of a node inside its [`DeviceTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Encoding of the elements of a scalar leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldInfo {
    pub word: WordSize,
    pub signed: bool,
    pub byte_order: ByteOrder,
}

/// What a node is: a container of children or a scalar register (array).
#[derive(Clone)]
pub enum NodeKind {
    /// A container. A hub carrying a transport terminates address resolution of the
    /// leaves underneath it.
    Hub { transport: Option<Arc<dyn Transport>> },
    /// A scalar leaf.
    Field(FieldInfo),
}

impl NodeKind {
    #[must_use]
    pub fn is_hub(&self) -> bool {
        matches!(self, NodeKind::Hub { .. })
    }

    #[must_use]
    pub fn field(&self) -> Option<FieldInfo> {
        match self {
            NodeKind::Field(info) => Some(*info),
            NodeKind::Hub { .. } => None,
        }
    }

    #[must_use]
    pub fn transport(&self) -> Option<&Arc<dyn Transport>> {
        match self {
            NodeKind::Hub { transport } => transport.as_ref(),
            NodeKind::Field(_) => None,
        }
    }
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Hub { transport } => f
                .debug_struct("Hub")
                .field("transport", &transport.is_some())
                .finish(),
            NodeKind::Field(info) => f.debug_tuple("Field").field(info).finish(),
        }
    }
}

/// A read-only handle on a node of a [`DeviceTree`].
#[derive(Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t DeviceTree,
    id: NodeId,
}

impl<'t> NodeRef<'t> {
    pub(crate) fn new(tree: &'t DeviceTree, id: NodeId) -> Self {
        Self { tree, id }
    }

    #[inline]
    fn data(&self) -> &'t NodeData {
        self.tree.data(self.id)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'t DeviceTree {
        self.tree
    }

    pub fn name(&self) -> &'t str {
        &self.data().name
    }

    /// Number of elements; 1 for non-array nodes.
    pub fn nelms(&self) -> u32 {
        self.data().nelms
    }

    pub fn is_array(&self) -> bool {
        self.nelms() > 1
    }

    pub fn kind(&self) -> &'t NodeKind {
        &self.data().kind
    }

    pub fn is_hub(&self) -> bool {
        self.kind().is_hub()
    }

    /// Byte offset of the first element inside the parent.
    pub fn offset(&self) -> u64 {
        self.data().offset
    }

    /// Distance in bytes between consecutive elements.
    pub fn stride(&self) -> u64 {
        self.data().stride
    }

    /// Byte size of one element.
    pub fn size(&self) -> u64 {
        self.data().size
    }

    pub fn description(&self) -> Option<&'t str> {
        self.data().description.as_deref()
    }

    /// Value names of a leaf, if it has any.
    pub fn enums(&self) -> Option<&'t Arc<EnumMap>> {
        self.data().enums.as_ref()
    }

    pub fn parent(&self) -> Option<NodeRef<'t>> {
        self.data().parent.map(|par| Self::new(self.tree, par))
    }

    pub fn children(&self) -> ChildIter<'t> {
        ChildIter::new(self.tree, self.data().first_child)
    }

    /// Iterate over this node and everything underneath it in depth-first pre-order.
    pub fn descendants(&self) -> DfsIter<'t> {
        DfsIter::new(self.tree, self.id)
    }

    /// Find a direct child by name.
    pub fn child(&self, name: &str) -> Option<NodeRef<'t>> {
        self.children().find(|c| c.name() == name)
    }

    /// True if `self` is `other` or lies underneath it.
    pub fn is_within(&self, other: NodeId) -> bool {
        let mut cur = Some(*self);
        while let Some(node) = cur {
            if node.id == other {
                return true;
            }
            cur = node.parent();
        }
        false
    }
}

impl<'t> PartialEq for NodeRef<'t> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl<'t> Eq for NodeRef<'t> {}

impl<'t> fmt::Debug for NodeRef<'t> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("nelms", &self.nelms())
            .finish()
    }
}
