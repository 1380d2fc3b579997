//! Writing configuration values onto paths and reading them back.

use serde_yaml::{Mapping, Value};
use tracing::trace;

use crate::error::{Error, Result};
use crate::path::{Path, PathVisitor};
use crate::value::ValueAccessor;

/// Parse `text` and write the values it describes onto `path`.
///
/// * A scalar is written to every element addressed by `path`.
/// * A sequence is written element by element; its length must match
///   [`Path::nelms`].
/// * A mapping applies each value to the path its key names relative to `path`.
///
/// Numbers may be written as YAML integers, booleans or strings holding a decimal or
/// `0x` hexadecimal number. A leaf with value names also accepts the names.
pub fn load_config_from_text(path: &Path, text: &str) -> Result<()> {
    let config: Value = serde_yaml::from_str(text)?;
    apply_config(path, &config)
}

/// [`load_config_from_text`] for an already parsed document.
pub fn apply_config(path: &Path, config: &Value) -> Result<()> {
    match config {
        Value::Null => Ok(()),
        Value::Mapping(entries) => {
            for (key, value) in entries {
                let key = key.as_str().ok_or_else(|| {
                    Error::InvalidArgument(format!("{}: configuration key is not a string", path))
                })?;
                apply_config(&path.find_by_name(key)?, value)?;
            }
            Ok(())
        }
        Value::Sequence(items) => {
            let acc = ValueAccessor::new(path)?;
            let values = items
                .iter()
                .map(|v| scalar(&acc, v))
                .collect::<Result<Vec<_>>>()?;
            trace!(%path, n = values.len(), "configure");
            acc.set_val(&values)
        }
        Value::Tagged(tagged) => apply_config(path, &tagged.value),
        value => {
            let acc = ValueAccessor::new(path)?;
            let v = scalar(&acc, value)?;
            trace!(%path, v, "configure");
            acc.set_all(v)
        }
    }
}

fn scalar(acc: &ValueAccessor, value: &Value) -> Result<u64> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_i64().map(|v| v as u64)),
        Value::Bool(b) => Some(u64::from(*b)),
        Value::String(s) => {
            let s = s.trim();
            let number = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some(hex) => u64::from_str_radix(hex, 16).ok(),
                None => s.parse().ok(),
            };
            number.or_else(|| acc.enum_map().and_then(|e| e.value_of(s)))
        }
        _ => None,
    };
    parsed.ok_or_else(|| {
        Error::InvalidArgument(format!(
            "{}: {:?} is not an integer value",
            acc.path(),
            value
        ))
    })
}

/// Read back every leaf underneath `path` that has a transport.
///
/// A leaf yields its value, or a sequence of values if it has several elements. Values
/// of a leaf with value names are dumped by name where they have one. A hub
/// yields a mapping from child names to their values; leaves without a transport and
/// empty hubs are left out.
pub fn dump_config(path: &Path) -> Result<Value> {
    let mut dumper = Dumper::default();
    path.explore(&mut dumper);
    match dumper.error {
        Some(e) => Err(e),
        None => Ok(dumper.result),
    }
}

#[derive(Default)]
struct Dumper {
    // One mapping per hub being visited.
    open: Vec<Mapping>,
    result: Value,
    error: Option<Error>,
}

impl Dumper {
    fn store(&mut self, here: &Path, value: Value) {
        match self.open.last_mut() {
            Some(parent) => {
                parent.insert(here.tail().name().into(), value);
            }
            None => self.result = value,
        }
    }

    fn read(here: &Path) -> Result<Option<Value>> {
        let acc = match ValueAccessor::new(here) {
            Ok(acc) => acc,
            Err(Error::InvalidPath(why)) => {
                trace!(%here, why = why.as_str(), "not dumped");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let signed = acc.field_info().signed;
        let names = acc.enum_map();
        let mut values = acc.get_val()?.into_iter().map(|v| {
            match names.and_then(|e| e.name_of(v)) {
                Some(name) => Value::from(name),
                None if signed => Value::from(v as i64),
                None => Value::from(v),
            }
        });
        Ok(Some(if acc.nelms() == 1 {
            values.next().unwrap_or(Value::Null)
        } else {
            Value::Sequence(values.collect())
        }))
    }
}

fn is_leaf(here: &Path) -> bool {
    here.tail().node().map_or(false, |n| !n.is_hub())
}

impl PathVisitor for Dumper {
    fn visit_pre(&mut self, here: &Path) -> bool {
        if self.error.is_some() {
            return false;
        }
        if !is_leaf(here) {
            self.open.push(Mapping::new());
            return true;
        }
        match Self::read(here) {
            Ok(Some(value)) => self.store(here, value),
            Ok(None) => {}
            Err(e) => self.error = Some(e),
        }
        false
    }

    fn visit_post(&mut self, here: &Path) {
        if is_leaf(here) {
            return;
        }
        if let Some(done) = self.open.pop() {
            if self.open.is_empty() || !done.is_empty() {
                self.store(here, Value::Mapping(done));
            }
        }
    }
}
