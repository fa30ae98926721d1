use crate::{
    disk::BackingStore,
    fs::{
        config::Layout,
        error::{FsError, Result},
    },
};

/// 数据区：不在内存里缓存任何块，每次读写都直接落到磁盘对应偏移
#[derive(Debug, Clone, Copy)]
pub struct DataArea {
    layout: Layout,
}

impl DataArea {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    pub fn block_size(&self) -> usize {
        self.layout.block_size as usize
    }

    fn check(&self, block: u32, offset: usize, len: usize) -> Result<()> {
        if block as u64 >= self.layout.block_count {
            return Err(FsError::CorruptImage(format!(
                "block index {block} out of range"
            )));
        }
        if offset + len > self.block_size() {
            return Err(FsError::CorruptImage(format!(
                "access {}..{} crosses the end of block {block}",
                offset,
                offset + len
            )));
        }
        Ok(())
    }

    /// 写入块内 `offset` 开始的字节
    pub fn write<S: BackingStore>(
        &self,
        disk: &S,
        block: u32,
        offset: usize,
        buf: &[u8],
    ) -> Result<()> {
        self.check(block, offset, buf.len())?;
        disk.write_at(self.layout.block_offset(block, offset), buf)?;
        Ok(())
    }

    pub fn read<S: BackingStore>(
        &self,
        disk: &S,
        block: u32,
        offset: usize,
        buf: &mut [u8],
    ) -> Result<()> {
        self.check(block, offset, buf.len())?;
        disk.read_at(self.layout.block_offset(block, offset), buf)?;
        Ok(())
    }

    /// 把块从 `from` 到块尾清零
    pub fn zero_from<S: BackingStore>(&self, disk: &S, block: u32, from: usize) -> Result<()> {
        let len = self.block_size().saturating_sub(from);
        self.write(disk, block, from, &vec![0u8; len])
    }

    pub fn zero<S: BackingStore>(&self, disk: &S, block: u32) -> Result<()> {
        self.zero_from(disk, block, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{disk::MemDisk, fs::config::Geometry};

    fn area() -> (MemDisk, DataArea) {
        let layout = Geometry::default().layout();
        let disk = MemDisk::with_len(layout.image_size() as usize);
        (disk, DataArea::new(layout))
    }

    #[test]
    fn writes_land_at_the_block_address() {
        let (disk, area) = area();
        area.write(&disk, 2, 5, b"abc").unwrap();
        let raw = disk.snapshot();
        let at = 8096 + 2 * 1024 + 5;
        assert_eq!(&raw[at..at + 3], b"abc");

        let mut buf = [0u8; 3];
        area.read(&disk, 2, 5, &mut buf).unwrap();
        assert_eq!(&buf, b"abc");

        area.zero(&disk, 2).unwrap();
        assert!(disk.snapshot()[at..at + 3].iter().all(|b| *b == 0));
    }

    #[test]
    fn refuses_out_of_range_access() {
        let (disk, area) = area();
        assert!(area.write(&disk, 64, 0, b"x").is_err());
        assert!(area.write(&disk, 0, 1020, b"too long").is_err());
    }
}
