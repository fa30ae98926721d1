use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    disk::BackingStore,
    fs::{
        config::{DIRECT_PTRS, INODE_SIZE},
        error::{FsError, Result},
    },
};

/// 文件类型，bincode 按 u32 变体号编码：目录 0，普通文件 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InodeType {
    Directory, // 目录
    File,      // 普通文件
}

impl fmt::Display for InodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory => f.write_str("directory"),
            Self::File => f.write_str("regular file"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inode {
    pub inode_type: InodeType,
    pub size: u32, // 文件大小（字节）

    // 只有直接块；有效的是前 ceil(size / block_size) 个
    pub direct_blocks: [u32; DIRECT_PTRS],
}

impl Inode {
    pub fn new(inode_type: InodeType) -> Self {
        Self {
            inode_type,
            size: 0,
            direct_blocks: [0; DIRECT_PTRS],
        }
    }

    /// 释放后的 inode 记录全部清零
    pub fn empty() -> Self {
        Self::new(InodeType::Directory)
    }

    pub fn is_dir(&self) -> bool {
        self.inode_type == InodeType::Directory
    }

    pub fn len(&self) -> usize {
        self.size as usize
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

#[derive(Debug, Clone)]
pub struct InodeTable {
    inodes: Vec<Inode>,
    offset: u64,
}

impl InodeTable {
    pub fn new(offset: u64, total_inodes: u32) -> Self {
        Self {
            inodes: vec![Inode::empty(); total_inodes as usize],
            offset,
        }
    }

    pub fn get(&self, index: u32) -> Result<&Inode> {
        self.inodes
            .get(index as usize)
            .ok_or(FsError::InvalidInode(index))
    }

    pub fn get_mut(&mut self, index: u32) -> Result<&mut Inode> {
        self.inodes
            .get_mut(index as usize)
            .ok_or(FsError::InvalidInode(index))
    }

    /// 把 inode 重置为指定类型的空文件
    pub fn reset(&mut self, index: u32, inode_type: InodeType) -> Result<()> {
        *self.get_mut(index)? = Inode::new(inode_type);
        Ok(())
    }

    pub fn clear(&mut self, index: u32) -> Result<()> {
        *self.get_mut(index)? = Inode::empty();
        Ok(())
    }

    pub fn sync<S: BackingStore>(&self, disk: &S) -> Result<()> {
        let mut bytes = Vec::with_capacity(self.inodes.len() * INODE_SIZE as usize);
        for inode in &self.inodes {
            bincode::serialize_into(&mut bytes, inode)?;
        }
        disk.write_at(self.offset, &bytes)?;
        Ok(())
    }

    pub fn load<S: BackingStore>(disk: &S, offset: u64, total_inodes: u32) -> Result<Self> {
        let mut bytes = vec![0u8; total_inodes as usize * INODE_SIZE as usize];
        disk.read_at(offset, &mut bytes)?;

        let inodes = bytes
            .chunks_exact(INODE_SIZE as usize)
            .map(|chunk| bincode::deserialize::<Inode>(chunk))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self { inodes, offset })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::MemDisk;

    #[test]
    fn inode_record_is_32_bytes() {
        let mut inode = Inode::new(InodeType::File);
        inode.size = 1500;
        inode.direct_blocks[0] = 7;
        inode.direct_blocks[1] = 9;

        let bytes = bincode::serialize(&inode).unwrap();
        assert_eq!(bytes.len(), INODE_SIZE as usize);
        assert_eq!(&bytes[..4], &1u32.to_le_bytes());
        assert_eq!(&bytes[4..8], &1500u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &7u32.to_le_bytes());
    }

    #[test]
    fn table_survives_sync_and_load() {
        let disk = MemDisk::with_len(1024);
        let mut table = InodeTable::new(100, 4);
        table.reset(2, InodeType::File).unwrap();
        table.get_mut(2).unwrap().size = 12;
        table.sync(&disk).unwrap();

        let loaded = InodeTable::load(&disk, 100, 4).unwrap();
        assert_eq!(loaded.get(2).unwrap().size, 12);
        assert_eq!(loaded.get(2).unwrap().inode_type, InodeType::File);
        assert!(matches!(loaded.get(4), Err(FsError::InvalidInode(4))));
    }

    #[test]
    fn unknown_type_tag_is_corruption() {
        let disk = MemDisk::with_len(64);
        disk.write_at(0, &9u32.to_le_bytes()).unwrap();
        assert!(matches!(
            InodeTable::load(&disk, 0, 1),
            Err(FsError::CorruptImage(_))
        ));
    }
}
