use crate::fs::error::{FsError, Result};

/// 魔数，用于识别 MiniFS 镜像
pub const MAGIC: u64 = 0xEF53;

/// 超级块固定放在第 1024 字节
pub const SUPER_BLOCK_OFFSET: u64 = 1024;
pub const SUPER_BLOCK_SIZE: u64 = 32;

/// 数据区最早的起始位置，默认几何下正好是 8096
pub const MIN_DATA_OFFSET: u64 = 8096;

// 默认几何：64 块 × 1KB，16 个 inode
pub const DEFAULT_BLOCK_COUNT: u32 = 64;
pub const DEFAULT_INODE_COUNT: u32 = 16;
pub const DEFAULT_BLOCK_SIZE: u32 = 1024;

/// 每个 inode 只有直接块指针，没有间接块
pub const DIRECT_PTRS: usize = 6;

/// inode 在磁盘上的大小：type + file_len + 6 个块号，各 4 字节
pub const INODE_SIZE: u32 = 32;

/// 目录项：4 字节 inode 号 + 12 字节名字（最多 11 字节 + '\0'）
pub const NAME_LEN: usize = 12;
pub const MAX_NAME_LEN: usize = NAME_LEN - 1;
pub const DIR_ENTRY_SIZE: usize = 16;

/// 根目录永远是 0 号 inode
pub const ROOT_INODE: u32 = 0;

/// 文件系统的可调参数，格式化时写入超级块
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub block_count: u32,
    pub inode_count: u32,
    pub block_size: u32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            block_count: DEFAULT_BLOCK_COUNT,
            inode_count: DEFAULT_INODE_COUNT,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl Geometry {
    pub fn validate(&self) -> Result<()> {
        if self.block_count == 0 {
            return Err(FsError::CorruptImage("block count is zero".into()));
        }
        if self.inode_count == 0 {
            return Err(FsError::CorruptImage("inode count is zero".into()));
        }
        // 目录项不能跨块
        if self.block_size == 0 || self.block_size as usize % DIR_ENTRY_SIZE != 0 {
            return Err(FsError::CorruptImage(format!(
                "block size {} is not a multiple of {}",
                self.block_size, DIR_ENTRY_SIZE
            )));
        }
        match self.layout().checked_image_size() {
            Some(size) if size <= i64::MAX as u64 => {}
            _ => return Err(FsError::CorruptImage("image too large".into())),
        }
        Ok(())
    }

    /// 单个文件的最大长度（字节）
    pub fn max_file_size(&self) -> usize {
        DIRECT_PTRS * self.block_size as usize
    }

    /// 存放 `len` 字节需要多少个数据块
    pub fn blocks_for(&self, len: usize) -> usize {
        len.div_ceil(self.block_size as usize)
    }

    pub fn layout(&self) -> Layout {
        Layout::new(self)
    }
}

/// 各区域在磁盘上的字节偏移
///
/// ```text
/// | 保留 1KB | 超级块 | 块位图 | inode 位图 | inode 表 | ... | 数据区 |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub super_block: u64,
    pub block_bitmap: u64,
    pub inode_bitmap: u64,
    pub inode_table: u64,
    pub data: u64,
    pub block_size: u64,
    pub block_count: u64,
}

impl Layout {
    fn new(geometry: &Geometry) -> Self {
        let super_block = SUPER_BLOCK_OFFSET;
        // 位图每项占 1 字节
        let block_bitmap = super_block + SUPER_BLOCK_SIZE;
        let inode_bitmap = block_bitmap + geometry.block_count as u64;
        let inode_table = inode_bitmap + geometry.inode_count as u64;
        let table_end = inode_table + geometry.inode_count as u64 * INODE_SIZE as u64;

        Self {
            super_block,
            block_bitmap,
            inode_bitmap,
            inode_table,
            data: table_end.max(MIN_DATA_OFFSET),
            block_size: geometry.block_size as u64,
            block_count: geometry.block_count as u64,
        }
    }

    /// 数据块 `block` 内偏移 `offset` 处的绝对地址
    pub fn block_offset(&self, block: u32, offset: usize) -> u64 {
        self.data + block as u64 * self.block_size + offset as u64
    }

    /// 只对通过 `Geometry::validate` 的几何调用
    pub fn image_size(&self) -> u64 {
        self.data + self.block_count * self.block_size
    }

    pub fn checked_image_size(&self) -> Option<u64> {
        self.block_count
            .checked_mul(self.block_size)?
            .checked_add(self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_matches_the_classic_offsets() {
        let layout = Geometry::default().layout();
        assert_eq!(layout.super_block, 1024);
        assert_eq!(layout.block_bitmap, 1056);
        assert_eq!(layout.inode_bitmap, 1120);
        assert_eq!(layout.inode_table, 1136);
        assert_eq!(layout.data, 8096);
        assert_eq!(layout.image_size(), 8096 + 64 * 1024);
        assert_eq!(layout.block_offset(3, 10), 8096 + 3 * 1024 + 10);
    }

    #[test]
    fn large_tables_push_the_data_region_back() {
        let geometry = Geometry {
            block_count: 1024,
            inode_count: 256,
            block_size: 512,
        };
        let layout = geometry.layout();
        assert_eq!(layout.inode_table, 1056 + 1024 + 256);
        assert_eq!(layout.data, layout.inode_table + 256 * 32);
        assert_eq!(geometry.max_file_size(), 6 * 512);
    }

    #[test]
    fn rejects_unaligned_block_size() {
        let geometry = Geometry {
            block_size: 1000,
            ..Geometry::default()
        };
        assert!(matches!(geometry.validate(), Err(FsError::CorruptImage(_))));
        assert!(Geometry::default().validate().is_ok());
    }

    #[test]
    fn huge_geometry_is_too_large_not_a_panic() {
        let geometry = Geometry {
            block_count: u32::MAX,
            inode_count: u32::MAX,
            block_size: 0xFFFF_FFF0,
        };
        assert_eq!(geometry.layout().checked_image_size(), None);
        match geometry.validate() {
            Err(FsError::CorruptImage(msg)) => assert!(msg.contains("too large")),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
