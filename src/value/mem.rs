use core::convert::TryFrom;

use parking_lot::RwLock;

use super::transport::Transport;
use crate::error::{Error, Result};

/// A [`Transport`] backed by a zero-initialized block of host memory.
#[derive(Debug)]
pub struct MemDevice {
    mem: RwLock<Vec<u8>>,
}

impl MemDevice {
    pub fn new(size: usize) -> Self {
        Self {
            mem: RwLock::new(vec![0; size]),
        }
    }

    fn span(&self, offset: u64, len: usize, limit: usize) -> Result<core::ops::Range<usize>> {
        let start = usize::try_from(offset).ok().filter(|&s| s <= limit);
        match start.and_then(|s| s.checked_add(len).map(|e| (s, e))) {
            Some((s, e)) if e <= limit => Ok(s..e),
            _ => Err(Error::Io(format!(
                "access of {} bytes at {:#x} beyond end of {:#x} byte device",
                len, offset, limit
            ))),
        }
    }
}

impl Transport for MemDevice {
    fn read(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let mem = self.mem.read();
        let span = self.span(offset, buf.len(), mem.len())?;
        buf.copy_from_slice(&mem[span]);
        Ok(())
    }

    fn write(&self, offset: u64, buf: &[u8]) -> Result<()> {
        let mut mem = self.mem.write();
        let span = self.span(offset, buf.len(), mem.len())?;
        mem[span].copy_from_slice(buf);
        Ok(())
    }

    fn size(&self) -> u64 {
        self.mem.read().len() as u64
    }
}
