//! Depth-first traversal of the subtree underneath a path.

use super::path::Path;
use super::segment::Range;
use crate::tree::NodeId;

/// Receives the nodes of a traversal started with [`Path::explore`].
pub trait PathVisitor {
    /// Called when entering a node, before its children. Returning `false` skips the
    /// children of `here`; [`PathVisitor::visit_post`] is still called for it.
    fn visit_pre(&mut self, here: &Path) -> bool;

    /// Called when leaving a node, pruned or not.
    fn visit_post(&mut self, _here: &Path) {}
}

/// A [`PathVisitor`] made of two closures.
pub struct FnVisitor<Pre, Post> {
    pre: Pre,
    post: Post,
}

impl<Pre, Post> FnVisitor<Pre, Post>
where
    Pre: FnMut(&Path) -> bool,
    Post: FnMut(&Path),
{
    pub fn new(pre: Pre, post: Post) -> Self {
        Self { pre, post }
    }
}

impl<Pre, Post> PathVisitor for FnVisitor<Pre, Post>
where
    Pre: FnMut(&Path) -> bool,
    Post: FnMut(&Path),
{
    fn visit_pre(&mut self, here: &Path) -> bool {
        (self.pre)(here)
    }

    fn visit_post(&mut self, here: &Path) {
        (self.post)(here)
    }
}

struct Frame {
    // Next child of the frame's node still to be entered.
    next: Option<NodeId>,
    // Range the parent's segment had before this node was pushed.
    restore: Option<Range>,
}

impl Path {
    /// Walk the subtree rooted at this path's terminal node (the origin for an empty
    /// path), the root included.
    ///
    /// Children are entered in declaration order. The path handed to the visitor is
    /// this path extended down to the current node; while below the root, the root's
    /// range is lifted since only the terminal segment may carry one.
    pub fn explore(&self, visitor: &mut dyn PathVisitor) {
        let mut here = self.clone();
        let tree = self.tree.clone();

        let mut stack = Vec::new();
        if visitor.visit_pre(&here) {
            stack.push(Frame {
                next: tree.data(here.anchor()).first_child,
                restore: None,
            });
        } else {
            visitor.visit_post(&here);
            return;
        }

        while let Some(top) = stack.last_mut() {
            match top.next {
                Some(id) => {
                    let data = tree.data(id);
                    top.next = data.next_sibling;
                    let restore = here.push_segment(id, None);
                    if visitor.visit_pre(&here) {
                        stack.push(Frame {
                            next: data.first_child,
                            restore,
                        });
                    } else {
                        visitor.visit_post(&here);
                        here.pop_segment(restore);
                    }
                }
                None => {
                    visitor.visit_post(&here);
                    if let Some(done) = stack.pop() {
                        if !stack.is_empty() {
                            here.pop_segment(done.restore);
                        }
                    }
                }
            }
        }
    }
}
