use core::fmt::Debug;

use crate::error::Result;

/// Moves bytes between memory and a device.
///
/// A transport is attached to a hub of the [`DeviceTree`](crate::tree::DeviceTree); the
/// offsets it receives are relative to that hub. Implementations report failures as
/// [`Error::Io`](crate::error::Error::Io). They may be called from several threads at
/// once and must serialize access to the device themselves.
pub trait Transport: Send + Sync + Debug {
    /// Fill `buf` with the bytes found at `offset`.
    fn read(&self, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// Store `buf` at `offset`.
    fn write(&self, offset: u64, buf: &[u8]) -> Result<()>;

    /// Size of the address space in bytes.
    fn size(&self) -> u64;
}
