//! The device tree model: a statically described hierarchy of hubs and scalar registers.
//!
//! # Overview
//!
//! A [`DeviceTree`] is built once, either by hand through a [`TreeBuilder`] or from a
//! description document (see [`crate::config`]), and is immutable afterwards. Every
//! node has a name that is unique among its siblings, an ordered list of children and
//! an element count (1 for non-array nodes).
//!
//! Nodes are stored in an arena. A node's parent is recorded as a [`NodeId`], so the
//! tree contains no reference cycles and may be shared freely between threads.
//!
//! # Examples
//!
//! ```
//! use regpath::tree::*;
//! use regpath::defs::WordSize;
//!
//! let mut builder = TreeBuilder::new();
//! builder.begin_node(NodeSpec::hub("root")).unwrap();
//! builder
//!     .add_node(NodeSpec::field("status", FieldInfo { word: WordSize::U32, ..Default::default() }).nelms(8))
//!     .unwrap();
//! builder.end_node().unwrap();
//!
//! let tree = builder.build().unwrap();
//! assert_eq!(tree.root().child("status").unwrap().nelms(), 8);
//! ```

mod enums;
#[doc(hidden)]
pub mod node;
#[doc(hidden)]
pub mod tree;

pub mod iters;

#[doc(inline)]
pub use enums::EnumMap;
#[doc(inline)]
pub use node::*;
#[doc(inline)]
pub use tree::{DeviceTree, NodeSpec, TreeBuilder};
