use std::sync::Arc;

use tracing::trace;

use super::enums::EnumMap;
use super::iters::DfsIter;
use super::node::{FieldInfo, NodeId, NodeKind, NodeRef};
use crate::error::{Error, Result};
use crate::value::Transport;

pub(crate) struct NodeData {
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    // Only consulted while building; lets appends run in constant time.
    last_child: Option<NodeId>,
    pub(crate) next_sibling: Option<NodeId>,
    pub(crate) nelms: u32,
    pub(crate) offset: u64,
    pub(crate) stride: u64,
    pub(crate) size: u64,
    pub(crate) description: Option<String>,
    pub(crate) enums: Option<Arc<EnumMap>>,
    pub(crate) kind: NodeKind,
}

/// An immutable hierarchy of named hubs and scalar leaves.
///
/// Nodes live in a single arena and refer to each other by [`NodeId`]; a parent link is
/// never an owning reference. Once built, a tree is shared through an [`Arc`] and may be
/// read from any number of threads.
pub struct DeviceTree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl DeviceTree {
    #[inline]
    pub(crate) fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    pub fn root(&self) -> NodeRef<'_> {
        NodeRef::new(self, self.root)
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// Returns `None` if `id` was not issued by this tree.
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        if id.index() < self.nodes.len() {
            Some(NodeRef::new(self, id))
        } else {
            None
        }
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn nodes(&self) -> DfsIter<'_> {
        DfsIter::new(self, self.root)
    }
}

impl core::fmt::Debug for DeviceTree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DeviceTree")
            .field("root", &self.root().name())
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

/// Description of a node handed to the [`TreeBuilder`].
#[derive(Debug, Clone)]
pub struct NodeSpec {
    name: String,
    nelms: u32,
    offset: u64,
    stride: Option<u64>,
    size: u64,
    description: Option<String>,
    enums: Option<Arc<EnumMap>>,
    kind: NodeKind,
}

impl NodeSpec {
    pub fn hub<S: Into<String>>(name: S) -> Self {
        Self::new(name.into(), NodeKind::Hub { transport: None })
    }

    pub fn field<S: Into<String>>(name: S, info: FieldInfo) -> Self {
        let mut this = Self::new(name.into(), NodeKind::Field(info));
        this.size = info.word.bytes() as u64;
        this
    }

    fn new(name: String, kind: NodeKind) -> Self {
        Self {
            name,
            nelms: 1,
            offset: 0,
            stride: None,
            size: 0,
            description: None,
            enums: None,
            kind,
        }
    }

    pub fn nelms(mut self, nelms: u32) -> Self {
        self.nelms = nelms;
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn stride(mut self, stride: u64) -> Self {
        self.stride = Some(stride);
        self
    }

    pub fn size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Name the values of a leaf. Ignored for hubs.
    pub fn enums(mut self, enums: EnumMap) -> Self {
        if !self.kind.is_hub() {
            self.enums = Some(Arc::new(enums));
        }
        self
    }

    /// Attach a transport. Ignored for leaves.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        if let NodeKind::Hub { transport: t } = &mut self.kind {
            *t = Some(transport);
        }
        self
    }
}

/// Assembles a [`DeviceTree`] from a stream of begin/end events.
///
/// The first node begun is the root. Every `begin_node` must be matched by an
/// `end_node` before [`TreeBuilder::build`] is called.
#[derive(Default)]
pub struct TreeBuilder {
    nodes: Vec<NodeData>,
    cur_node: Option<NodeId>,
    root: Option<NodeId>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_node(&mut self, spec: NodeSpec) -> Result<NodeId> {
        if spec.nelms == 0 {
            return Err(Error::InvalidArgument(format!(
                "'{}': element count must be at least 1",
                spec.name
            )));
        }
        if spec.name.is_empty() || spec.name.contains(|c: char| matches!(c, '/' | '.' | '[' | ']')) {
            return Err(Error::InvalidArgument(format!(
                "'{}': not a valid node name",
                spec.name
            )));
        }

        let parent = self.cur_node;
        match parent {
            None if self.root.is_some() => {
                return Err(Error::InvalidArgument(format!(
                    "'{}': a tree has a single root",
                    spec.name
                )));
            }
            Some(par) => {
                if !self.nodes[par.index()].kind.is_hub() {
                    return Err(Error::InvalidArgument(format!(
                        "'{}': a leaf cannot have children",
                        self.nodes[par.index()].name
                    )));
                }
                if self.has_child(par, &spec.name) {
                    return Err(Error::InvalidArgument(format!(
                        "'{}': duplicate child of '{}'",
                        spec.name,
                        self.nodes[par.index()].name
                    )));
                }
            }
            None => {}
        }

        let new_id = NodeId(self.nodes.len() as u32);
        let stride = spec.stride.unwrap_or(spec.size);
        self.nodes.push(NodeData {
            name: spec.name,
            parent,
            first_child: None,
            last_child: None,
            next_sibling: None,
            nelms: spec.nelms,
            offset: spec.offset,
            stride,
            size: spec.size,
            description: spec.description,
            enums: spec.enums,
            kind: spec.kind,
        });

        match parent {
            Some(par) => {
                match self.nodes[par.index()].last_child {
                    Some(prev) => self.nodes[prev.index()].next_sibling = Some(new_id),
                    None => self.nodes[par.index()].first_child = Some(new_id),
                }
                self.nodes[par.index()].last_child = Some(new_id);
            }
            None => self.root = Some(new_id),
        }

        trace!(name = %self.nodes[new_id.index()].name, ?parent, "begin node");
        self.cur_node = Some(new_id);
        Ok(new_id)
    }

    pub fn end_node(&mut self) -> Result<()> {
        // More end_node calls than begin_node ones.
        let cur = self
            .cur_node
            .ok_or_else(|| Error::InvalidArgument("unbalanced end of node".into()))?;
        self.cur_node = self.nodes[cur.index()].parent;
        Ok(())
    }

    /// Add a node without children.
    pub fn add_node(&mut self, spec: NodeSpec) -> Result<NodeId> {
        let id = self.begin_node(spec)?;
        self.end_node()?;
        Ok(id)
    }

    fn has_child(&self, parent: NodeId, name: &str) -> bool {
        let mut cur = self.nodes[parent.index()].first_child;
        while let Some(id) = cur {
            if self.nodes[id.index()].name == name {
                return true;
            }
            cur = self.nodes[id.index()].next_sibling;
        }
        false
    }

    pub fn build(self) -> Result<Arc<DeviceTree>> {
        if let Some(open) = self.cur_node {
            return Err(Error::InvalidArgument(format!(
                "'{}' was never closed",
                self.nodes[open.index()].name
            )));
        }
        let root = self
            .root
            .ok_or_else(|| Error::InvalidArgument("empty tree".into()))?;
        Ok(Arc::new(DeviceTree {
            nodes: self.nodes,
            root,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::WordSize;

    fn leaf(word: WordSize) -> FieldInfo {
        FieldInfo {
            word,
            ..FieldInfo::default()
        }
    }

    fn sample() -> Arc<DeviceTree> {
        let mut b = TreeBuilder::new();
        b.begin_node(NodeSpec::hub("root").size(0x100)).unwrap();
        b.begin_node(NodeSpec::hub("outer").nelms(2).size(0x40)).unwrap();
        b.add_node(NodeSpec::field("leaf", leaf(WordSize::U8))).unwrap();
        b.add_node(NodeSpec::field("leaf1", leaf(WordSize::U16)).nelms(4).offset(4))
            .unwrap();
        b.end_node().unwrap();
        b.add_node(NodeSpec::field("status", leaf(WordSize::U32)).offset(0x80))
            .unwrap();
        b.end_node().unwrap();
        b.build().unwrap()
    }

    #[test]
    fn children_keep_declaration_order() {
        let tree = sample();
        let root = tree.root();
        let names: Vec<_> = root.children().map(|c| c.name()).collect();
        assert_eq!(names, ["outer", "status"]);

        let outer = root.child("outer").unwrap();
        let names: Vec<_> = outer.children().map(|c| c.name()).collect();
        assert_eq!(names, ["leaf", "leaf1"]);
        assert_eq!(outer.nelms(), 2);
        assert!(outer.is_array());
    }

    #[test]
    fn parent_links() {
        let tree = sample();
        let leaf1 = tree.root().child("outer").unwrap().child("leaf1").unwrap();
        assert_eq!(leaf1.parent().unwrap().name(), "outer");
        assert_eq!(leaf1.stride(), 2);
        assert!(leaf1.is_within(tree.root_id()));
        assert!(tree.root().parent().is_none());
    }

    #[test]
    fn rejects_bad_shapes() {
        let mut b = TreeBuilder::new();
        b.begin_node(NodeSpec::hub("root")).unwrap();
        b.add_node(NodeSpec::hub("a")).unwrap();
        assert!(matches!(
            b.add_node(NodeSpec::hub("a")),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            b.add_node(NodeSpec::hub("b").nelms(0)),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            b.add_node(NodeSpec::hub("c[1]")),
            Err(Error::InvalidArgument(_))
        ));
        b.begin_node(NodeSpec::field("f", leaf(WordSize::U8))).unwrap();
        assert!(matches!(
            b.add_node(NodeSpec::hub("under-leaf")),
            Err(Error::InvalidArgument(_))
        ));
        b.end_node().unwrap();
        b.end_node().unwrap();
        assert!(b.end_node().is_err());
    }

    #[test]
    fn unbalanced_build_fails() {
        let mut b = TreeBuilder::new();
        b.begin_node(NodeSpec::hub("root")).unwrap();
        assert!(b.build().is_err());
        assert!(TreeBuilder::new().build().is_err());
    }
}
