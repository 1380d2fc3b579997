//! Line preprocessor run over description documents before they are parsed.
//!
//! Directives are only recognized in the header of a file, i.e. the leading lines
//! starting with `#`:
//!
//! * `#include <file>` splices the preprocessed body of `<file>` in front of the body of
//!   the including file. The file is looked up in the include directories in order, then
//!   next to the including file.
//! * `#once <tag>` skips the rest of the file if `<tag>` was seen before.
//! * `#schemaversion <major>.<minor>.<revision>` declares the schema the file follows.
//!
//! Any other header line is a comment.

use std::collections::HashSet;
use std::fs;
use std::path::{Path as FsPath, PathBuf};

use tracing::{debug, trace};

use crate::defs::{MAX_SUPPORTED_SCHEMA, MIN_SUPPORTED_SCHEMA};
use crate::error::{Error, Result};

/// Includes nested deeper than this are reported as a cycle.
const MAX_INCLUDE_DEPTH: usize = 32;

/// A `#schemaversion` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SchemaVersion {
    pub major: u32,
    pub minor: u32,
    pub revision: u32,
}

impl SchemaVersion {
    fn parse(text: &str, name: &str) -> Result<Self> {
        let bad = || {
            Error::Document(format!(
                "{}: #schemaversion needs <major>.<minor>.<revision>, got '{}'",
                name, text
            ))
        };
        let mut parts = text.trim().splitn(3, '.').map(|p| p.parse::<u32>());
        let mut next = || parts.next().and_then(|p| p.ok()).ok_or_else(bad);
        Ok(Self {
            major: next()?,
            minor: next()?,
            revision: next()?,
        })
    }
}

/// Expands the directives of a document and its includes into a single text.
#[derive(Debug)]
pub struct Preprocessor<'d> {
    include_dirs: &'d [PathBuf],
    tags: HashSet<String>,
    schema: Option<SchemaVersion>,
    depth: usize,
    out: String,
}

impl<'d> Preprocessor<'d> {
    pub fn new(include_dirs: &'d [PathBuf]) -> Self {
        Self {
            include_dirs,
            tags: HashSet::new(),
            schema: None,
            depth: 0,
            out: String::new(),
        }
    }

    /// Lowest schema version declared by any processed file, if any declared one.
    pub fn schema(&self) -> Option<SchemaVersion> {
        self.schema
    }

    /// Process a document given as text. Includes are resolved relative to `dir` after
    /// the include directories.
    pub fn process_text(&mut self, text: &str, name: &str, dir: Option<&FsPath>) -> Result<()> {
        let mut body = text;
        loop {
            let (line, rest) = match body.find('\n') {
                Some(nl) => (&body[..nl], &body[nl + 1..]),
                None => (body, ""),
            };
            let line = line.trim_end_matches('\r');
            if !line.starts_with('#') {
                break;
            }
            body = rest;

            if let Some(tag) = directive(line, "once") {
                if tag.is_empty() {
                    return Err(Error::Document(format!("{}: #once lacks a tag", name)));
                }
                if !self.tags.insert(tag.to_string()) {
                    debug!(file = name, tag, "already included");
                    return Ok(());
                }
            } else if let Some(file) = directive(line, "include") {
                let file = file.split_whitespace().next().ok_or_else(|| {
                    Error::Document(format!("{}: #include lacks a file name", name))
                })?;
                let found = self.resolve(file, dir)?;
                self.process_file(&found)?;
            } else if let Some(version) = directive(line, "schemaversion") {
                self.declare(SchemaVersion::parse(version, name)?, name)?;
            }
        }

        self.out.push_str(body);
        if !body.is_empty() && !body.ends_with('\n') {
            self.out.push('\n');
        }
        Ok(())
    }

    /// Process the document stored in `file`.
    pub fn process_file(&mut self, file: &FsPath) -> Result<()> {
        if self.depth >= MAX_INCLUDE_DEPTH {
            return Err(Error::Document(format!(
                "{}: includes nested too deeply",
                file.display()
            )));
        }
        let text = fs::read_to_string(file)
            .map_err(|e| Error::Document(format!("{}: {}", file.display(), e)))?;
        trace!(file = %file.display(), "preprocessing");

        self.depth += 1;
        let res = self.process_text(&text, &file.display().to_string(), file.parent());
        self.depth -= 1;
        res
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn resolve(&self, file: &str, dir: Option<&FsPath>) -> Result<PathBuf> {
        let name = FsPath::new(file);
        if name.is_absolute() {
            return Ok(name.to_path_buf());
        }
        self.include_dirs
            .iter()
            .map(PathBuf::as_path)
            .chain(dir)
            .map(|d| d.join(name))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| Error::Document(format!("include file '{}' not found", file)))
    }

    fn declare(&mut self, version: SchemaVersion, name: &str) -> Result<()> {
        if version.major < MIN_SUPPORTED_SCHEMA || version.major > MAX_SUPPORTED_SCHEMA {
            return Err(Error::Document(format!(
                "{}: schema major version {} not supported",
                name, version.major
            )));
        }
        match self.schema {
            Some(seen) if seen.major != version.major => Err(Error::Document(format!(
                "{}: schema major version {} differs from {}",
                name, version.major, seen.major
            ))),
            Some(seen) if seen <= version => Ok(()),
            _ => {
                self.schema = Some(version);
                Ok(())
            }
        }
    }
}

// The argument of `#<name> ...`, if `line` is that directive.
fn directive<'l>(line: &'l str, name: &str) -> Option<&'l str> {
    let rest = line.strip_prefix('#')?.strip_prefix(name)?;
    if rest.is_empty() {
        return Some("");
    }
    if rest.starts_with(|c: char| c == ' ' || c == '\t') {
        Some(rest.trim())
    } else {
        None
    }
}
