//! Access to the values of scalar leaves.
//!
//! Values move through a [`Transport`] attached to a hub of the tree. A
//! [`ValueAccessor`] bound to a [`Path`](crate::path::Path) reads the addressed
//! elements either blocking ([`ValueAccessor::get_val`]) or through a callback run by an
//! [`AsyncDispatcher`] ([`ValueAccessor::get_val_async`]).
//!
//! # Examples
//!
//! ```
//! # fn main() -> regpath::error::Result<()> {
//! use regpath::config::load_tree_from_str;
//! use regpath::value::{completion, ValueAccessor};
//!
//! let root = load_tree_from_str(
//!     "root:\n  class: MemDev\n  size: 64\n  children:\n    regs:\n      class: IntField\n      at: { nelms: 4 }\n",
//!     None,
//! )?;
//! let regs = ValueAccessor::new(&root.find_by_name("regs")?)?;
//! regs.set_val(&[1, 2, 3, 4])?;
//!
//! let (done, waiter) = completion();
//! regs.get_val_async(done)?;
//! assert_eq!(waiter.wait_result()?, regs.get_val()?);
//! # Ok(())
//! # }
//! ```

mod accessor;
pub mod dispatch;
mod mem;
mod transport;

#[doc(inline)]
pub use accessor::ValueAccessor;
#[doc(inline)]
pub use dispatch::{completion, AsyncDispatcher, AsyncIo, Completer, Completion, ValueSequence};
#[doc(inline)]
pub use mem::MemDevice;
#[doc(inline)]
pub use transport::Transport;

assert_impl_all!(ValueAccessor: Send, Sync, Clone);
assert_impl_all!(MemDevice: Transport);
