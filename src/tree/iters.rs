use super::node::{NodeId, NodeRef};
use super::tree::DeviceTree;

/***********************************/
/***********  Children   ***********/
/***********************************/

/// Iterates over the children of a node in declaration order.
#[derive(Clone)]
pub struct ChildIter<'t> {
    tree: &'t DeviceTree,
    next: Option<NodeId>,
}

impl<'t> ChildIter<'t> {
    pub(super) fn new(tree: &'t DeviceTree, first: Option<NodeId>) -> Self {
        Self { tree, next: first }
    }
}

impl<'t> Iterator for ChildIter<'t> {
    type Item = NodeRef<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next.map(|id| {
            self.next = self.tree.data(id).next_sibling;
            NodeRef::new(self.tree, id)
        })
    }
}

/***********************************/
/***********  Subtree    ***********/
/***********************************/

/// Depth-first, pre-order iteration over a subtree (its root included).
#[derive(Clone)]
pub struct DfsIter<'t> {
    tree: &'t DeviceTree,
    start: NodeId,
    next: Option<NodeId>,
}

impl<'t> DfsIter<'t> {
    pub(super) fn new(tree: &'t DeviceTree, start: NodeId) -> Self {
        Self {
            tree,
            start,
            next: Some(start),
        }
    }

    // The node following `id` in pre-order without leaving the subtree of `start`.
    fn next_dfs(&self, id: NodeId) -> Option<NodeId> {
        let data = self.tree.data(id);
        if let Some(child) = data.first_child {
            return Some(child);
        }
        let mut cur = id;
        while cur != self.start {
            let data = self.tree.data(cur);
            if let Some(sibling) = data.next_sibling {
                return Some(sibling);
            }
            cur = data.parent?;
        }
        None
    }
}

impl<'t> Iterator for DfsIter<'t> {
    type Item = NodeRef<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.next?;
        self.next = self.next_dfs(cur);
        Some(NodeRef::new(self.tree, cur))
    }
}
