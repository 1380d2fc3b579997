//! Loading of device description documents and of configuration values.
//!
//! A description document is YAML. Its top-level mapping holds the root node under a
//! configurable name (`root` by default) next to any number of helper entries, usually
//! anchors merged into nodes with `<<`. A node is a mapping of these keys, all optional:
//!
//! | key           | meaning                                                         |
//! |---------------|-----------------------------------------------------------------|
//! | `class`       | `Dev`, `MMIODev`, `MemDev` (hubs), `Field`, `IntField` (leaves)   |
//! | `children`    | mapping from child name to child node, in declaration order     |
//! | `at`          | `{ nelms, offset, stride }` placement inside the parent          |
//! | `size`        | byte size; a `MemDev` allocates that much memory                 |
//! | `sizeBits`    | width of a leaf element: 8, 16, 32 (default) or 64              |
//! | `isSigned`    | leaf elements are sign extended                                 |
//! | `byteOrder`   | `LE` (default) or `BE`                                          |
//! | `description` | free text                                                       |
//! | `enums`       | leaf value names: a list of `{ name, value }`                   |
//! | `instantiate` | `false` leaves the node and its subtree out                      |
//!
//! Before parsing, documents go through the [`preproc`] directives.

mod load;
mod poke;
pub mod preproc;

#[doc(inline)]
pub use load::{
    find_node, find_node_mut, load_tree, load_tree_from_file, load_tree_from_str,
    resolve_merges, DocumentSource, YamlFixup,
};
#[doc(inline)]
pub use poke::{apply_config, dump_config, load_config_from_text};
