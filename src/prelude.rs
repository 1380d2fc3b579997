//! Module exporting traits and the most used types of this library.
pub use crate::config::YamlFixup;
pub use crate::path::{FnVisitor, Path, PathVisitor};
pub use crate::value::{AsyncIo, Transport};

pub use fallible_iterator::FallibleIterator;
