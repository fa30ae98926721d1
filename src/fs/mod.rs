use log::{info, trace, warn};

use crate::{
    disk::BackingStore,
    fs::{
        bitmap::Bitmap,
        config::{Geometry, Layout, DIRECT_PTRS, ROOT_INODE},
        data_area::DataArea,
        error::{FsError, Pool, Result},
        inode_table::{Inode, InodeTable, InodeType},
        super_block::SuperBlock,
    },
};

pub mod bitmap;
pub mod config;
pub mod data_area;
pub mod directory;
pub mod error;
pub mod inode_table;
pub mod path;
pub mod super_block;

/// `stat` 看到的信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub inode: u32,
    pub inode_type: InodeType,
    pub len: usize,
    pub blocks: Vec<u32>,
}

/// 一个挂载好的文件系统：独占全部元数据，数据块不做缓存
#[derive(Debug)]
pub struct FileSystem<S: BackingStore> {
    disk: S,                    // 底层存储
    geometry: Geometry,         // 块数、inode 数、块大小
    layout: Layout,             // 各区域偏移
    super_block: SuperBlock,    // 文件系统总体信息
    block_bitmap: Bitmap,       // 数据块分配信息
    inode_bitmap: Bitmap,       // inode 分配信息
    inode_table: InodeTable,    // 所有 inode
    data_area: DataArea,        // 数据块读写
}

impl<S: BackingStore> FileSystem<S> {
    fn fresh(disk: S, geometry: Geometry) -> Self {
        let layout = geometry.layout();
        Self {
            disk,
            geometry,
            layout,
            super_block: SuperBlock::new(&geometry),
            block_bitmap: Bitmap::new(geometry.block_count, layout.block_bitmap),
            inode_bitmap: Bitmap::new(geometry.inode_count, layout.inode_bitmap),
            inode_table: InodeTable::new(layout.inode_table, geometry.inode_count),
            data_area: DataArea::new(layout),
        }
    }

    /// 格式化：清空元数据区，写入超级块，创建空的根目录
    pub fn format(disk: S, geometry: Geometry) -> Result<Self> {
        geometry.validate()?;
        let layout = geometry.layout();

        disk.set_len(layout.image_size())?;
        let capacity = disk.len()?;
        if capacity < layout.image_size() {
            return Err(FsError::CorruptImage(format!(
                "backing store holds {capacity} bytes, the image needs {}",
                layout.image_size()
            )));
        }
        disk.write_at(0, &vec![0u8; layout.data as usize])?;

        let mut fs = Self::fresh(disk, geometry);
        let root = fs.alloc_inode(InodeType::Directory)?;
        debug_assert_eq!(root, ROOT_INODE);
        fs.sync()?;

        info!(
            "formatted: {} blocks x {} bytes, {} inodes",
            geometry.block_count, geometry.block_size, geometry.inode_count
        );
        Ok(fs)
    }

    /// 从磁盘加载已有的文件系统
    pub fn mount(disk: S) -> Result<Self> {
        let super_block = SuperBlock::load(&disk)?;
        let geometry = super_block.geometry();
        let layout = geometry.layout();

        let capacity = disk.len()?;
        if capacity < layout.image_size() {
            return Err(FsError::CorruptImage(format!(
                "image is truncated: {capacity} of {} bytes",
                layout.image_size()
            )));
        }

        let block_bitmap = Bitmap::load(&disk, layout.block_bitmap, geometry.block_count)?;
        let inode_bitmap = Bitmap::load(&disk, layout.inode_bitmap, geometry.inode_count)?;
        let inode_table = InodeTable::load(&disk, layout.inode_table, geometry.inode_count)?;

        if !inode_bitmap.is_used(ROOT_INODE) || !inode_table.get(ROOT_INODE)?.is_dir() {
            return Err(FsError::CorruptImage("root directory is missing".into()));
        }

        let mut fs = Self {
            disk,
            geometry,
            layout,
            super_block,
            block_bitmap,
            inode_bitmap,
            inode_table,
            data_area: DataArea::new(layout),
        };
        fs.reconcile_counters();

        info!(
            "mounted: {}/{} blocks free, {}/{} inodes free",
            fs.free_blocks(),
            geometry.block_count,
            fs.free_inodes(),
            geometry.inode_count
        );
        Ok(fs)
    }

    // 位图才是准的，超级块里的计数和它不一致时以位图为准
    fn reconcile_counters(&mut self) {
        let blocks = self.block_bitmap.free_count();
        let inodes = self.inode_bitmap.free_count();
        if self.super_block.free_block_count != blocks {
            warn!(
                "superblock claims {} free blocks, bitmap has {blocks}",
                self.super_block.free_block_count
            );
            self.super_block.free_block_count = blocks;
        }
        if self.super_block.free_inode_count != inodes {
            warn!(
                "superblock claims {} free inodes, bitmap has {inodes}",
                self.super_block.free_inode_count
            );
            self.super_block.free_inode_count = inodes;
        }
    }

    /// 把超级块、两张位图和 inode 表写回磁盘。数据块在写入时已经落盘。
    pub fn sync(&mut self) -> Result<()> {
        self.super_block.sync(&self.disk)?;
        self.block_bitmap.sync(&self.disk)?;
        self.inode_bitmap.sync(&self.disk)?;
        self.inode_table.sync(&self.disk)?;
        Ok(())
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn super_block(&self) -> &SuperBlock {
        &self.super_block
    }

    pub fn free_blocks(&self) -> u32 {
        self.super_block.free_block_count
    }

    pub fn free_inodes(&self) -> u32 {
        self.super_block.free_inode_count
    }

    pub fn disk(&self) -> &S {
        &self.disk
    }

    pub fn into_disk(self) -> S {
        self.disk
    }

    pub fn inode(&self, index: u32) -> Result<&Inode> {
        if !self.inode_bitmap.is_used(index) {
            return Err(FsError::InvalidInode(index));
        }
        self.inode_table.get(index)
    }

    /// 文件当前占用的块（按文件内顺序）
    fn blocks_of(&self, inode: &Inode) -> Result<Vec<u32>> {
        let count = self.geometry.blocks_for(inode.len());
        if count > DIRECT_PTRS {
            return Err(FsError::CorruptImage(format!(
                "inode claims {} bytes, more than {} direct blocks hold",
                inode.len(),
                DIRECT_PTRS
            )));
        }
        Ok(inode.direct_blocks[..count].to_vec())
    }

    pub fn metadata(&self, index: u32) -> Result<Metadata> {
        let inode = self.inode(index)?;
        Ok(Metadata {
            inode: index,
            inode_type: inode.inode_type,
            len: inode.len(),
            blocks: self.blocks_of(inode)?,
        })
    }

    // 分配一个空闲 inode，返回 inode 编号
    pub fn alloc_inode(&mut self, inode_type: InodeType) -> Result<u32> {
        let index = self
            .inode_bitmap
            .alloc()
            .ok_or(FsError::PoolExhausted(Pool::Inodes))?;
        self.super_block.free_inode_count -= 1;
        self.inode_table.reset(index, inode_type)?;
        trace!("alloc inode {index} ({inode_type})");
        Ok(index)
    }

    // 分配一个空闲数据块，返回块号
    pub fn alloc_block(&mut self) -> Result<u32> {
        let block = self
            .block_bitmap
            .alloc()
            .ok_or(FsError::PoolExhausted(Pool::Blocks))?;
        self.super_block.free_block_count -= 1;
        trace!("alloc block {block}");
        Ok(block)
    }

    /// 释放数据块，内容清零
    pub fn free_block(&mut self, block: u32) -> Result<()> {
        self.data_area.zero(&self.disk, block)?;
        if self.block_bitmap.free(block) {
            self.super_block.free_block_count += 1;
            trace!("free block {block}");
        } else {
            warn!("block {block} was already free");
        }
        Ok(())
    }

    /// 释放 inode 以及它引用的全部数据块
    pub fn free_inode(&mut self, index: u32) -> Result<()> {
        if !self.inode_bitmap.is_used(index) {
            warn!("inode {index} was already free");
            return Ok(());
        }

        let inode = self.inode_table.get(index)?.clone();
        for block in self.blocks_of(&inode)? {
            self.free_block(block)?;
        }
        self.inode_table.clear(index)?;
        self.inode_bitmap.free(index);
        self.super_block.free_inode_count += 1;
        trace!("free inode {index}");
        Ok(())
    }

    // 写之前先确认长度上限和空闲块都够，失败时什么都不改
    fn reserve(&self, inode: &Inode, new_len: usize) -> Result<()> {
        let limit = self.geometry.max_file_size();
        if new_len > limit {
            return Err(FsError::CapacityExceeded {
                requested: new_len,
                limit,
            });
        }
        let needed = self
            .geometry
            .blocks_for(new_len)
            .saturating_sub(self.geometry.blocks_for(inode.len()));
        if needed > self.free_blocks() as usize {
            return Err(FsError::PoolExhausted(Pool::Blocks));
        }
        Ok(())
    }

    /// 把 `data` 追加到文件末尾，当前块写满时再分配新块
    pub fn append(&mut self, index: u32, data: &[u8]) -> Result<()> {
        let inode = self.inode(index)?.clone();
        self.reserve(&inode, inode.len() + data.len())?;

        let block_size = self.data_area.block_size();
        let mut pos = inode.len();
        let mut rest = data;

        while !rest.is_empty() {
            let slot = pos / block_size;
            let within = pos % block_size;

            if within == 0 {
                let block = self.alloc_block()?;
                self.inode_table.get_mut(index)?.direct_blocks[slot] = block;
            }

            let block = self.inode_table.get(index)?.direct_blocks[slot];
            let n = rest.len().min(block_size - within);
            self.data_area.write(&self.disk, block, within, &rest[..n])?;

            rest = &rest[n..];
            pos += n;
            self.inode_table.get_mut(index)?.size = pos as u32;
        }
        Ok(())
    }

    /// 覆盖写：`offset` 之后的内容被 `data` 替换，超出文件尾的部分追加，
    /// `offset` 超过文件尾时中间补零
    pub fn write_at(&mut self, index: u32, offset: usize, data: &[u8]) -> Result<()> {
        let inode = self.inode(index)?.clone();
        let end = offset + data.len();
        self.reserve(&inode, end.max(inode.len()))?;

        if offset > inode.len() {
            self.append(index, &vec![0u8; offset - inode.len()])?;
        }

        let len = self.inode_table.get(index)?.len();
        let (overlap, tail) = data.split_at(data.len().min(len - offset));

        let block_size = self.data_area.block_size();
        let mut pos = offset;
        let mut rest = overlap;
        while !rest.is_empty() {
            let slot = pos / block_size;
            let within = pos % block_size;
            let block = self.inode_table.get(index)?.direct_blocks[slot];
            let n = rest.len().min(block_size - within);
            self.data_area.write(&self.disk, block, within, &rest[..n])?;
            rest = &rest[n..];
            pos += n;
        }

        self.append(index, tail)
    }

    /// 调整文件长度。缩短时清零被截掉的字节，并释放 ceil(new_len / block_size)
    /// 之后不再使用的块。
    pub fn truncate(&mut self, index: u32, new_len: usize) -> Result<()> {
        let inode = self.inode(index)?.clone();
        if new_len >= inode.len() {
            return self.append(index, &vec![0u8; new_len - inode.len()]);
        }

        let blocks = self.blocks_of(&inode)?;
        let keep = self.geometry.blocks_for(new_len);
        for (slot, block) in blocks.iter().enumerate().skip(keep) {
            self.free_block(*block)?;
            self.inode_table.get_mut(index)?.direct_blocks[slot] = 0;
        }

        let within = new_len % self.data_area.block_size();
        if within != 0 {
            self.data_area.zero_from(&self.disk, blocks[keep - 1], within)?;
        }

        self.inode_table.get_mut(index)?.size = new_len as u32;
        Ok(())
    }

    /// 按块顺序读出整个文件
    pub fn read_file(&self, index: u32) -> Result<Vec<u8>> {
        let inode = self.inode(index)?;
        let blocks = self.blocks_of(inode)?;

        let mut content = vec![0u8; inode.len()];
        for (chunk, block) in content
            .chunks_mut(self.data_area.block_size())
            .zip(blocks)
        {
            self.data_area.read(&self.disk, block, 0, chunk)?;
        }
        Ok(content)
    }
}
