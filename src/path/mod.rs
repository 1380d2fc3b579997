//! Addressing of nodes and element ranges inside a [`DeviceTree`](crate::tree::DeviceTree).
//!
//! A [`Path`] is a cheap value: it shares the tree through an `Arc` and holds a list of
//! [`Segment`]s. Only the terminal segment may restrict the addressed elements with a
//! [`Range`].
//!
//! # Examples
//!
//! ```
//! # fn main() -> regpath::error::Result<()> {
//! use regpath::config::load_tree_from_str;
//!
//! let root = load_tree_from_str(
//!     "root:\n  children:\n    regs:\n      class: IntField\n      at: { nelms: 16 }\n",
//!     None,
//! )?;
//! let all = root.find_by_name("regs")?;
//! let some = root.find_by_name("regs[4-7]")?;
//! assert!(all.is_intersecting(&some));
//! assert_eq!(all.intersect(&some)?.to_string(), "/regs[4-7]");
//! # Ok(())
//! # }
//! ```

mod algebra;
pub mod explore;
pub mod parse;
#[doc(hidden)]
pub mod path;
pub mod segment;

#[doc(inline)]
pub use explore::{FnVisitor, PathVisitor};
#[doc(inline)]
pub use path::{Path, Tail};
#[doc(inline)]
pub use segment::{Range, Segment};

assert_impl_all!(Path: Send, Sync, Clone);
