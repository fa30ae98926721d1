use std::io::{Error, ErrorKind, Result};

use parking_lot::Mutex;

use crate::disk::backing_store::BackingStore;

/// 内存盘：测试和临时文件系统用，内容随进程消失
#[derive(Debug, Default)]
pub struct MemDisk {
    bytes: Mutex<Vec<u8>>,
}

impl MemDisk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_len(len: usize) -> Self {
        Self {
            bytes: Mutex::new(vec![0; len]),
        }
    }

    /// 拷贝出整块内容，方便测试检查磁盘布局
    pub fn snapshot(&self) -> Vec<u8> {
        self.bytes.lock().clone()
    }

    fn range(offset: u64, len: usize, size: usize) -> Result<std::ops::Range<usize>> {
        let start = usize::try_from(offset)
            .map_err(|_| Error::new(ErrorKind::InvalidInput, "offset out of range"))?;
        let end = start
            .checked_add(len)
            .ok_or_else(|| Error::new(ErrorKind::InvalidInput, "offset out of range"))?;
        if end > size {
            return Err(Error::new(
                ErrorKind::UnexpectedEof,
                format!("access {start}..{end} beyond end of disk ({size} bytes)"),
            ));
        }
        Ok(start..end)
    }
}

impl BackingStore for MemDisk {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let bytes = self.bytes.lock();
        let range = Self::range(offset, buf.len(), bytes.len())?;
        buf.copy_from_slice(&bytes[range]);
        Ok(())
    }

    fn write_at(&self, offset: u64, buf: &[u8]) -> Result<()> {
        let mut bytes = self.bytes.lock();
        let range = Self::range(offset, buf.len(), bytes.len())?;
        bytes[range].copy_from_slice(buf);
        Ok(())
    }

    fn set_len(&self, size: u64) -> Result<()> {
        let size = usize::try_from(size)
            .map_err(|_| Error::new(ErrorKind::InvalidInput, "disk too large"))?;
        self.bytes.lock().resize(size, 0);
        Ok(())
    }

    fn len(&self) -> Result<u64> {
        Ok(self.bytes.lock().len() as u64)
    }
}
