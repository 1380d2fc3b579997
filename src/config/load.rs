use core::convert::TryFrom;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::{debug, trace};

use super::preproc::Preprocessor;
use crate::defs::{ByteOrder, NodeClass, WordSize, DEFAULT_ROOT_NAME, KEY_MERGE};
use crate::error::{Error, Result};
use crate::path::Path;
use crate::tree::{DeviceTree, EnumMap, FieldInfo, NodeSpec, TreeBuilder};
use crate::value::MemDevice;

/// Where a description document comes from.
#[derive(Debug, Clone, Copy)]
pub enum DocumentSource<'a> {
    Text(&'a str),
    File(&'a FsPath),
}

/// A hook editing a freshly parsed document before the tree is built from it.
///
/// `root` is the entry of the root node; it is detached from `top`, the document's
/// top-level mapping, for the duration of the call. Merge keys are still unresolved.
pub trait YamlFixup {
    fn fixup(&mut self, root: &mut Value, top: &mut Mapping);
}

impl<F> YamlFixup for F
where
    F: FnMut(&mut Value, &mut Mapping),
{
    fn fixup(&mut self, root: &mut Value, top: &mut Mapping) {
        self(root, top)
    }
}

#[derive(Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct NodeDesc {
    class: NodeClass,
    children: Mapping,
    at: AtDesc,
    size: Option<u64>,
    size_bits: Option<u64>,
    is_signed: bool,
    byte_order: ByteOrder,
    description: Option<String>,
    enums: Option<Vec<EnumItemDesc>>,
    instantiate: bool,
}

impl Default for NodeDesc {
    fn default() -> Self {
        Self {
            class: NodeClass::default(),
            children: Mapping::new(),
            at: AtDesc::default(),
            size: None,
            size_bits: None,
            is_signed: false,
            byte_order: ByteOrder::default(),
            description: None,
            enums: None,
            instantiate: true,
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct AtDesc {
    nelms: u32,
    offset: u64,
    stride: Option<u64>,
}

#[derive(Deserialize)]
struct EnumItemDesc {
    name: String,
    value: u64,
}

impl Default for AtDesc {
    fn default() -> Self {
        Self {
            nelms: 1,
            offset: 0,
            stride: None,
        }
    }
}

/// Build a [`DeviceTree`] from a description document and return the empty path
/// anchored at its root.
///
/// The document is preprocessed (see [`super::preproc`]), parsed, handed to `fixup`
/// once, merge keys are resolved, and the node stored under `root_name` (default
/// `"root"`) in the top-level mapping becomes the root of the tree.
pub fn load_tree(
    source: DocumentSource<'_>,
    root_name: Option<&str>,
    include_dirs: &[PathBuf],
    fixup: Option<&mut dyn YamlFixup>,
) -> Result<Path> {
    let mut pp = Preprocessor::new(include_dirs);
    match source {
        DocumentSource::Text(text) => pp.process_text(text, "<text>", None)?,
        DocumentSource::File(file) => pp.process_file(file)?,
    }
    let text = pp.finish();

    let mut top = match serde_yaml::from_str::<Value>(&text)? {
        Value::Mapping(top) => top,
        _ => return Err(Error::Document("top level is not a mapping".into())),
    };
    let root_name = root_name.unwrap_or(DEFAULT_ROOT_NAME);
    let mut root = top
        .shift_remove(root_name)
        .ok_or_else(|| Error::Document(format!("no root node '{}'", root_name)))?;

    if let Some(fixup) = fixup {
        debug!(root = root_name, "running fixup");
        fixup.fixup(&mut root, &mut top);
    }

    resolve_merges(&mut root)?;
    let tree = build_tree(root_name, root)?;
    debug!(root = root_name, nodes = tree.len(), "loaded device tree");
    Ok(Path::new(&tree))
}

/// [`load_tree`] for a document held in memory, without includes or fixup.
pub fn load_tree_from_str(text: &str, root_name: Option<&str>) -> Result<Path> {
    load_tree(DocumentSource::Text(text), root_name, &[], None)
}

/// [`load_tree`] for a document stored in a file, without fixup.
pub fn load_tree_from_file(
    file: &FsPath,
    root_name: Option<&str>,
    include_dirs: &[PathBuf],
) -> Result<Path> {
    load_tree(DocumentSource::File(file), root_name, include_dirs, None)
}

/// Resolve all merge keys below `node`.
///
/// Mappings are merged deeply: an entry of the merging mapping wins over the merged
/// one, except that two mappings stored under the same key are merged in turn.
pub fn resolve_merges(node: &mut Value) -> Result<()> {
    match node {
        Value::Mapping(map) => {
            while let Some(merged) = map.shift_remove(KEY_MERGE) {
                match merged {
                    Value::Mapping(src) => merge_into(map, src),
                    Value::Sequence(seq) => {
                        for item in seq {
                            match item {
                                Value::Mapping(src) => merge_into(map, src),
                                _ => {
                                    return Err(Error::Document(
                                        "merge sequence entry is not a mapping".into(),
                                    ))
                                }
                            }
                        }
                    }
                    _ => {
                        return Err(Error::Document(
                            "merge key value is not a mapping".into(),
                        ))
                    }
                }
            }
            for value in map.values_mut() {
                resolve_merges(value)?;
            }
        }
        Value::Sequence(seq) => {
            for value in seq {
                resolve_merges(value)?;
            }
        }
        Value::Tagged(tagged) => resolve_merges(&mut tagged.value)?,
        _ => {}
    }
    Ok(())
}

fn merge_into(dst: &mut Mapping, src: Mapping) {
    for (key, value) in src {
        match dst.get_mut(&key) {
            None => {
                dst.insert(key, value);
            }
            Some(Value::Mapping(existing)) => {
                if let Value::Mapping(value) = value {
                    merge_into(existing, value);
                }
            }
            Some(_) => {}
        }
    }
}

fn build_tree(root_name: &str, root: Value) -> Result<Arc<DeviceTree>> {
    let mut builder = TreeBuilder::new();
    if !build_node(&mut builder, root_name, root)? {
        return Err(Error::Document(format!(
            "root node '{}' is not instantiated",
            root_name
        )));
    }
    builder.build()
}

// Returns false if the node is not instantiated.
fn build_node(builder: &mut TreeBuilder, name: &str, node: Value) -> Result<bool> {
    let desc: NodeDesc = match node {
        Value::Null => NodeDesc::default(),
        node => serde_yaml::from_value(node)
            .map_err(|e| Error::Document(format!("node '{}': {}", name, e)))?,
    };
    if !desc.instantiate {
        trace!(name, "not instantiated");
        return Ok(false);
    }

    let mut spec = if desc.class.is_hub() {
        if desc.enums.is_some() {
            return Err(Error::Document(format!(
                "'{}': only leaves have value names",
                name
            )));
        }
        let mut spec = NodeSpec::hub(name);
        if let Some(size) = desc.size {
            spec = spec.size(size);
        }
        if desc.class == NodeClass::MemDev {
            let size = desc.size.filter(|&s| s > 0).ok_or_else(|| {
                Error::InvalidArgument(format!("'{}': memory device needs a size", name))
            })?;
            let size = usize::try_from(size).map_err(|_| {
                Error::InvalidArgument(format!("'{}': size {:#x} too large", name, size))
            })?;
            spec = spec.transport(Arc::new(MemDevice::new(size)));
        }
        spec
    } else {
        if !desc.children.is_empty() {
            return Err(Error::Document(format!(
                "'{}': a {:?} cannot have children",
                name, desc.class
            )));
        }
        let bits = desc
            .size_bits
            .or_else(|| desc.size.map(|bytes| bytes * 8))
            .unwrap_or_else(|| u64::from(WordSize::default().bits()));
        let mut spec = NodeSpec::field(
            name,
            FieldInfo {
                word: WordSize::from_bits(bits)?,
                signed: desc.is_signed,
                byte_order: desc.byte_order,
            },
        );
        if let Some(items) = desc.enums {
            let mut enums = EnumMap::new();
            for item in items {
                enums.add(item.name, item.value)?;
            }
            spec = spec.enums(enums);
        }
        spec
    };

    spec = spec.nelms(desc.at.nelms).offset(desc.at.offset);
    if let Some(stride) = desc.at.stride {
        spec = spec.stride(stride);
    }
    if let Some(description) = desc.description {
        spec = spec.description(description);
    }

    builder.begin_node(spec)?;
    for (key, child) in desc.children {
        let child_name = key
            .as_str()
            .ok_or_else(|| Error::Document(format!("'{}': child name is not a string", name)))?
            .to_string();
        build_node(builder, &child_name, child)?;
    }
    builder.end_node()?;
    Ok(true)
}

/// Look up `path`, a list of mapping keys joined by `sep`, in `node`, looking through
/// merge keys where a mapping lacks a key.
pub fn find_node<'v>(node: &'v Value, path: &str, sep: char) -> Option<&'v Value> {
    path.split(sep)
        .filter(|key| !key.is_empty())
        .try_fold(node, |cur, key| lookup(cur.as_mapping()?, key))
}

fn lookup<'v>(map: &'v Mapping, key: &str) -> Option<&'v Value> {
    if let Some(found) = map.get(key) {
        return Some(found);
    }
    match map.get(KEY_MERGE)? {
        Value::Mapping(merged) => lookup(merged, key),
        Value::Sequence(seq) => seq
            .iter()
            .filter_map(Value::as_mapping)
            .find_map(|merged| lookup(merged, key)),
        _ => None,
    }
}

/// Mutable version of [`find_node`].
pub fn find_node_mut<'v>(node: &'v mut Value, path: &str, sep: char) -> Option<&'v mut Value> {
    path.split(sep)
        .filter(|key| !key.is_empty())
        .try_fold(node, |cur, key| lookup_mut(cur.as_mapping_mut()?, key))
}

fn lookup_mut<'v>(map: &'v mut Mapping, key: &str) -> Option<&'v mut Value> {
    if map.contains_key(key) {
        return map.get_mut(key);
    }
    match map.get_mut(KEY_MERGE)? {
        Value::Mapping(merged) => lookup_mut(merged, key),
        Value::Sequence(seq) => seq
            .iter_mut()
            .filter_map(Value::as_mapping_mut)
            .find_map(|merged| lookup_mut(merged, key)),
        _ => None,
    }
}
