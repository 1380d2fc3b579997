//! Tokenizer for textual path specifications.
//!
//! A specification is a sequence of components separated by `/` or `.`. Each component
//! is a node name, optionally followed by an element selector: `[n]` for a single
//! element or `[from-to]` for an inclusive range.
//!
//! ```text
//! mmio/srvm/arr-32-0-0-le[10-20]
//! mmio.srvm.regs[3]
//! ```

use fallible_iterator::FallibleIterator;

use super::segment::Range;
use crate::error::{Error, Result};

#[inline]
fn is_separator(c: char) -> bool {
    c == '/' || c == '.'
}

/// One parsed component of a path specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component<'s> {
    pub name: &'s str,
    pub range: Option<Range>,
}

/// Iterates over the [`Component`]s of a specification; malformed components are
/// reported as [`Error::InvalidPath`].
#[derive(Debug, Clone)]
pub struct SpecIter<'s> {
    rest: &'s str,
}

impl<'s> SpecIter<'s> {
    pub fn new(spec: &'s str) -> Self {
        Self { rest: spec }
    }
}

fn parse_index(digits: &str, component: &str) -> Result<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidPath(component.into()));
    }
    digits
        .parse()
        .map_err(|_| Error::InvalidPath(component.into()))
}

/// Parse a single component such as `name`, `name[3]` or `name[3-7]`.
pub fn parse_component(text: &str) -> Result<Component<'_>> {
    let (name, range) = match text.find('[') {
        None => {
            if text.contains(']') {
                return Err(Error::InvalidPath(text.into()));
            }
            (text, None)
        }
        Some(op) => {
            // The selector must close the component.
            let inner = text[op + 1..]
                .strip_suffix(']')
                .ok_or_else(|| Error::InvalidPath(text.into()))?;
            if inner.contains(|c: char| c == '[' || c == ']') {
                return Err(Error::InvalidPath(text.into()));
            }
            let range = match inner.find('-') {
                Some(mi) => Range::new(
                    parse_index(&inner[..mi], text)?,
                    parse_index(&inner[mi + 1..], text)?,
                )
                .map_err(|_| Error::InvalidPath(text.into()))?,
                None => Range::single(parse_index(inner, text)?),
            };
            (&text[..op], Some(range))
        }
    };

    if name.is_empty() {
        return Err(Error::InvalidPath(text.into()));
    }
    Ok(Component { name, range })
}

impl<'s> FallibleIterator for SpecIter<'s> {
    type Item = Component<'s>;
    type Error = Error;

    fn next(&mut self) -> Result<Option<Self::Item>> {
        let trimmed = self.rest.trim_start_matches(is_separator);
        if trimmed.is_empty() {
            self.rest = trimmed;
            return Ok(None);
        }
        let end = trimmed.find(is_separator).unwrap_or_else(|| trimmed.len());
        let (text, rest) = trimmed.split_at(end);
        self.rest = rest;
        parse_component(text).map(Some)
    }
}
