use std::sync::Arc;

use tracing::trace;

use super::dispatch::{AsyncDispatcher, AsyncIo, ValueSequence};
use super::transport::Transport;
use crate::defs::ByteOrder;
use crate::error::{Error, Result};
use crate::path::{Path, Range};
use crate::tree::{EnumMap, FieldInfo};

/// Reads and writes the elements addressed by a path ending in a scalar leaf.
///
/// The accessor resolves the address of element 0 once, when it is created. Every
/// element is then transferred on its own, so bytes between strided elements are never
/// touched. An accessor is cheap to clone and may be shared between threads.
#[derive(Debug, Clone)]
pub struct ValueAccessor {
    path: Path,
    transport: Arc<dyn Transport>,
    info: FieldInfo,
    enums: Option<Arc<EnumMap>>,
    // Offset of element 0 relative to the transport.
    base: u64,
    stride: u64,
    range: Range,
}

impl ValueAccessor {
    /// Bind an accessor to `path`.
    ///
    /// Fails with [`Error::InvalidPath`] unless `path` ends in a scalar leaf that sits
    /// below a hub with a transport, and every node in between is a single element.
    /// Fails with [`Error::InvalidArgument`] if an element address does not fit 64 bits.
    pub fn new(path: &Path) -> Result<Self> {
        let leaf = path
            .tail()
            .node()
            .ok_or_else(|| Error::InvalidPath("empty path has no value".into()))?;
        let info = leaf
            .kind()
            .field()
            .ok_or_else(|| Error::InvalidPath(format!("{}: not a scalar leaf", path)))?;

        let mut base = leaf.offset();
        let mut cur = leaf.parent();
        let transport = loop {
            let node = cur.ok_or_else(|| {
                Error::InvalidPath(format!("{}: no transport above this leaf", path))
            })?;
            if let Some(transport) = node.kind().transport() {
                break Arc::clone(transport);
            }
            if node.is_array() {
                return Err(Error::InvalidPath(format!(
                    "{}: '{}' is an array of {} above the leaf",
                    path,
                    node.name(),
                    node.nelms()
                )));
            }
            base = base.checked_add(node.offset()).ok_or_else(|| {
                Error::InvalidArgument(format!("{}: address overflows", path))
            })?;
            cur = node.parent();
        };

        let this = Self {
            path: path.clone(),
            transport,
            info,
            enums: leaf.enums().cloned(),
            base,
            stride: leaf.stride(),
            range: path.tail_range()?,
        };
        this.address(leaf.nelms() - 1)?;
        Ok(this)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of elements read or written by every call; equal to the path's
    /// [`Path::nelms`].
    pub fn nelms(&self) -> u32 {
        self.range.len()
    }

    pub fn field_info(&self) -> FieldInfo {
        self.info
    }

    /// Value names of the leaf, if it has any.
    pub fn enum_map(&self) -> Option<&EnumMap> {
        self.enums.as_deref()
    }

    #[inline]
    fn address(&self, idx: u32) -> Result<u64> {
        self.stride
            .checked_mul(u64::from(idx))
            .and_then(|off| off.checked_add(self.base))
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "{}: address of element {} overflows",
                    self.path, idx
                ))
            })
    }

    fn indices(&self) -> core::ops::RangeInclusive<u32> {
        self.range.from()..=self.range.to()
    }

    fn decode(&self, raw: &[u8]) -> u64 {
        let fold = |acc: u64, b: &u8| (acc << 8) | u64::from(*b);
        let v = match self.info.byte_order {
            ByteOrder::LE => raw.iter().rev().fold(0, fold),
            ByteOrder::BE => raw.iter().fold(0, fold),
        };
        if self.info.signed {
            self.sign_extend(v)
        } else {
            v
        }
    }

    fn encode(&self, v: u64, raw: &mut [u8]) -> Result<()> {
        let mask = self.info.word.mask();
        let fits = v & !mask == 0 || (self.info.signed && self.sign_extend(v & mask) == v);
        if !fits {
            return Err(Error::InvalidArgument(format!(
                "{}: {:#x} does not fit {} bits",
                self.path,
                v,
                self.info.word.bits()
            )));
        }
        let n = raw.len();
        for (i, b) in raw.iter_mut().enumerate() {
            let shift = 8 * match self.info.byte_order {
                ByteOrder::LE => i,
                ByteOrder::BE => n - 1 - i,
            };
            *b = (v >> shift) as u8;
        }
        Ok(())
    }

    // `v` must already be masked to the word size.
    fn sign_extend(&self, v: u64) -> u64 {
        let shift = 64 - self.info.word.bits();
        (((v << shift) as i64) >> shift) as u64
    }

    /// Read every addressed element, blocking until the transport is done.
    pub fn get_val(&self) -> Result<ValueSequence> {
        let mut buf = [0u8; 8];
        let raw = &mut buf[..self.info.word.bytes()];
        let mut values = ValueSequence::with_capacity(self.nelms() as usize);
        for idx in self.indices() {
            self.transport.read(self.address(idx)?, raw)?;
            values.push(self.decode(raw));
        }
        Ok(values)
    }

    /// Like [`ValueAccessor::get_val`], converting into `T`.
    ///
    /// Fails with [`Error::InvalidArgument`] if an element does not fit into `T`.
    pub fn get_val_as<T: num_traits::PrimInt>(&self) -> Result<Vec<T>> {
        let signed = self.info.signed;
        self.get_val()?
            .into_iter()
            .map(|v| {
                let conv = if signed {
                    <T as num_traits::NumCast>::from(v as i64)
                } else {
                    <T as num_traits::NumCast>::from(v)
                };
                conv.ok_or_else(|| {
                    Error::InvalidArgument(format!("{}: {:#x} out of range", self.path, v))
                })
            })
            .collect()
    }

    /// Write `values`, one per addressed element.
    pub fn set_val(&self, values: &[u64]) -> Result<()> {
        if values.len() != self.nelms() as usize {
            return Err(Error::InvalidArgument(format!(
                "{}: {} values for {} elements",
                self.path,
                values.len(),
                self.nelms()
            )));
        }
        let mut buf = [0u8; 8];
        let raw = &mut buf[..self.info.word.bytes()];
        for (idx, v) in self.indices().zip(values) {
            self.encode(*v, raw)?;
            self.transport.write(self.address(idx)?, raw)?;
        }
        Ok(())
    }

    /// Write `value` to every addressed element.
    pub fn set_all(&self, value: u64) -> Result<()> {
        self.set_val(&vec![value; self.nelms() as usize])
    }

    fn names(&self) -> Result<&EnumMap> {
        self.enum_map()
            .ok_or_else(|| Error::InvalidPath(format!("{}: values have no names", self.path)))
    }

    /// Read every addressed element and map it to its name.
    ///
    /// Fails with [`Error::InvalidPath`] if the leaf has no [`EnumMap`] and with
    /// [`Error::InvalidArgument`] if a value read has no name.
    pub fn get_val_names(&self) -> Result<Vec<String>> {
        let names = self.names()?;
        self.get_val()?
            .into_iter()
            .map(|v| {
                names.name_of(v).map(String::from).ok_or_else(|| {
                    Error::InvalidArgument(format!("{}: {:#x} has no name", self.path, v))
                })
            })
            .collect()
    }

    /// Write the value called `name` to every addressed element.
    pub fn set_all_named(&self, name: &str) -> Result<()> {
        let value = self.names()?.value_of(name).ok_or_else(|| {
            Error::InvalidArgument(format!("{}: no value named '{}'", self.path, name))
        })?;
        self.set_all(value)
    }

    /// Start a read on the global [`AsyncDispatcher`] and return without waiting.
    ///
    /// `callback` runs exactly once on a dispatcher thread unless an error is returned,
    /// in which case the read was never started and `callback` was dropped. Any number
    /// of reads may be in flight at once.
    pub fn get_val_async<C: AsyncIo>(&self, callback: C) -> Result<()> {
        self.get_val_async_on(AsyncDispatcher::global(), callback)
    }

    /// Like [`ValueAccessor::get_val_async`] with an explicit dispatcher.
    pub fn get_val_async_on<C: AsyncIo>(
        &self,
        dispatcher: &AsyncDispatcher,
        callback: C,
    ) -> Result<()> {
        let this = self.clone();
        let callback: Box<dyn AsyncIo> = Box::new(callback);
        trace!(path = %self.path, "post read");
        dispatcher.post(Box::new(move || match this.get_val() {
            Ok(values) => callback.complete(values, None),
            Err(e) => callback.complete(ValueSequence::new(), Some(e)),
        }))
    }
}
