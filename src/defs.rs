//! Definitions shared by the tree model, the value accessors and the document loader.
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::Deserialize;

use crate::error::{Error, Result};

// Keys of the device description document.
pub const KEY_CHILDREN: &str = "children";
pub const KEY_SIZE_BITS: &str = "sizeBits";
pub const KEY_MERGE: &str = "<<";

/// Range of major schema versions understood by the loader.
pub const MIN_SUPPORTED_SCHEMA: u32 = 3;
pub const MAX_SUPPORTED_SCHEMA: u32 = 3;

/// Name given to the root node when the document does not name one.
pub const DEFAULT_ROOT_NAME: &str = "root";

/// Width of a scalar register element.
#[derive(FromPrimitive, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordSize {
    U8 = 8,
    U16 = 16,
    U32 = 32,
    U64 = 64,
}

impl WordSize {
    /// Validate a `sizeBits` value.
    pub fn from_bits(bits: u64) -> Result<Self> {
        FromPrimitive::from_u64(bits).ok_or_else(|| {
            Error::InvalidArgument(format!("unsupported {}: {}", KEY_SIZE_BITS, bits))
        })
    }

    #[inline]
    #[must_use]
    pub fn bits(self) -> u32 {
        self as u32
    }

    #[inline]
    #[must_use]
    pub fn bytes(self) -> usize {
        self as usize / 8
    }

    /// Mask selecting the bits of one element.
    #[inline]
    #[must_use]
    pub fn mask(self) -> u64 {
        match self {
            WordSize::U64 => u64::MAX,
            w => (1u64 << w.bits()) - 1,
        }
    }
}

impl Default for WordSize {
    fn default() -> Self {
        WordSize::U32
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    #[serde(alias = "le", alias = "little")]
    LE,
    #[serde(alias = "be", alias = "big")]
    BE,
}

impl Default for ByteOrder {
    fn default() -> Self {
        ByteOrder::LE
    }
}

/// The `class` of a described node.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    Dev,
    #[serde(rename = "MMIODev")]
    MmioDev,
    MemDev,
    Field,
    IntField,
}

impl NodeClass {
    #[must_use]
    pub fn is_hub(self) -> bool {
        matches!(self, NodeClass::Dev | NodeClass::MmioDev | NodeClass::MemDev)
    }
}

impl Default for NodeClass {
    fn default() -> Self {
        NodeClass::Dev
    }
}
