use serde::{Deserialize, Serialize};

use crate::{
    disk::BackingStore,
    fs::{
        config::{Geometry, INODE_SIZE, MAGIC, SUPER_BLOCK_OFFSET, SUPER_BLOCK_SIZE},
        error::{FsError, Result},
    },
};

/// 磁盘上的超级块，bincode 定长小端编码后正好 32 字节
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperBlock {
    pub block_count: u32,      // 数据块总数
    pub inode_count: u32,      // inode 总数
    pub free_block_count: u32, // 当前空闲块数
    pub free_inode_count: u32, // 当前空闲 inode 数
    pub block_size: u32,       // 每块大小（字节）
    pub inode_size: u32,       // 每个 inode 记录的大小
    pub magic: u64,            // 魔数，用于识别文件系统
}

impl SuperBlock {
    pub fn new(geometry: &Geometry) -> Self {
        Self {
            block_count: geometry.block_count,
            inode_count: geometry.inode_count,
            free_block_count: geometry.block_count,
            free_inode_count: geometry.inode_count,
            block_size: geometry.block_size,
            inode_size: INODE_SIZE,
            magic: MAGIC,
        }
    }

    pub fn geometry(&self) -> Geometry {
        Geometry {
            block_count: self.block_count,
            inode_count: self.inode_count,
            block_size: self.block_size,
        }
    }

    pub fn load<S: BackingStore>(disk: &S) -> Result<Self> {
        let mut buf = [0u8; SUPER_BLOCK_SIZE as usize];
        disk.read_at(SUPER_BLOCK_OFFSET, &mut buf)?;
        let sb: SuperBlock = bincode::deserialize(&buf)?;

        if sb.magic != MAGIC {
            return Err(FsError::CorruptImage(format!(
                "bad magic number {:#x}, expected {:#x}",
                sb.magic, MAGIC
            )));
        }
        if sb.inode_size != INODE_SIZE {
            return Err(FsError::CorruptImage(format!(
                "unsupported inode size {}",
                sb.inode_size
            )));
        }
        sb.geometry().validate()?;
        Ok(sb)
    }

    pub fn sync<S: BackingStore>(&self, disk: &S) -> Result<()> {
        let bytes = bincode::serialize(self)?;
        disk.write_at(SUPER_BLOCK_OFFSET, &bytes)?;
        Ok(())
    }
}
