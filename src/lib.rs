//! Hierarchical addressing of hardware registers.
//!
//! A [`DeviceTree`](tree::DeviceTree) describes devices as a tree of hubs and scalar
//! register arrays. A [`Path`](path::Path) names a node of that tree, optionally narrowed
//! to a range of its elements, and supports composition, intersection and traversal. A
//! [`ValueAccessor`](value::ValueAccessor) reads and writes the registers a path
//! addresses, blocking or asynchronously.
//!
//! Trees are usually loaded from a YAML description with [`config::load_tree`].
//!
//! # Examples
//!
//! ```
//! # fn main() -> regpath::error::Result<()> {
//! use regpath::prelude::*;
//! use regpath::config::{load_config_from_text, load_tree_from_str};
//! use regpath::value::ValueAccessor;
//!
//! let root = load_tree_from_str(
//!     "root:\n  class: MemDev\n  size: 0x1000\n  children:\n    arr: { class: IntField, at: { nelms: 32 } }\n",
//!     None,
//! )?;
//! let arr = root.find_by_name("arr")?;
//! load_config_from_text(&arr, "5555")?;
//! load_config_from_text(&root.find_by_name("arr[10-20]")?, "1111")?;
//!
//! let vals = ValueAccessor::new(&arr)?.get_val()?;
//! assert_eq!(vals[9..12], [5555, 1111, 1111]);
//!
//! let mut visited = 0;
//! root.explore(&mut FnVisitor::new(|_: &Path| { visited += 1; true }, |_: &Path| {}));
//! assert_eq!(visited, 2);
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate static_assertions;

pub mod config;
pub mod defs;
pub mod error;
pub mod path;
pub mod prelude;
pub mod tree;
pub mod value;

assert_impl_all!(tree::DeviceTree: Send, Sync);
