use std::{
    fs::{File, OpenOptions},
    io::{Read, Result, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use log::debug;
use parking_lot::Mutex;

use crate::disk::backing_store::BackingStore;

/// 以宿主文件（镜像文件或 /dev/minifs 这样的字符设备）作为磁盘
#[derive(Debug)]
pub struct FileDisk {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileDisk {
    /// 打开镜像，不存在则创建（长度为 0，由 format 负责扩容）
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BackingStore for FileDisk {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf)?;
        Ok(())
    }

    fn write_at(&self, offset: u64, buf: &[u8]) -> Result<()> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(buf)?;
        Ok(())
    }

    fn set_len(&self, size: u64) -> Result<()> {
        let file = self.file.lock();
        // 设备节点的大小是固定的，不能 ftruncate
        if !file.metadata()?.is_file() {
            debug!("{} is not a regular file, keeping its size", self.path.display());
            return Ok(());
        }
        file.set_len(size)
    }

    fn len(&self) -> Result<u64> {
        let mut file = self.file.lock();
        let meta = file.metadata()?;
        if meta.is_file() {
            return Ok(meta.len());
        }
        file.seek(SeekFrom::End(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positioned_io_on_a_temp_image() {
        let dir = tempfile::tempdir().unwrap();
        let disk = FileDisk::open(dir.path().join("disk.img")).unwrap();
        assert!(disk.is_empty().unwrap());

        disk.set_len(4096).unwrap();
        disk.write_at(1000, b"minifs").unwrap();

        let mut buf = [0u8; 6];
        disk.read_at(1000, &mut buf).unwrap();
        assert_eq!(&buf, b"minifs");
        assert_eq!(disk.len().unwrap(), 4096);

        let mut past_end = [0u8; 8];
        assert!(disk.read_at(4092, &mut past_end).is_err());
    }
}
