use crate::disk::BackingStore;
use crate::fs::error::Result;

/// 块 / inode 共用的位图
///
/// 内存中按位压缩存放，磁盘上每项占 1 字节（0 空闲，非 0 占用）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    bits: Vec<u8>,  // 位图数据，每个 bit 表示一项的状态
    total: u32,     // 总项数
    free: u32,      // 当前空闲项数
    offset: u64,    // 位图在磁盘中的起始字节（用于持久化）
}

impl Bitmap {
    // 创建一个新的位图（所有位清零 = 空闲）
    pub fn new(total: u32, offset: u64) -> Self {
        let byte_len = total.div_ceil(8) as usize;
        Self {
            bits: vec![0; byte_len],
            total,
            free: total,
            offset,
        }
    }

    /// 首次适配：返回编号最小的空闲项并标记为占用
    pub fn alloc(&mut self) -> Option<u32> {
        for (byte_index, byte) in self.bits.iter_mut().enumerate() {
            if *byte == 0xFF {
                continue;
            }
            for bit in 0..8 {
                let index = (byte_index * 8 + bit) as u32;
                if index >= self.total {
                    return None;
                }
                if *byte & (1 << bit) == 0 {
                    *byte |= 1 << bit;
                    self.free -= 1;
                    return Some(index);
                }
            }
        }
        None
    }

    /// 释放一项，越界或本来就空闲时返回 false
    pub fn free(&mut self, index: u32) -> bool {
        if !self.is_used(index) {
            return false;
        }
        self.bits[(index / 8) as usize] &= !(1 << (index % 8));
        self.free += 1;
        true
    }

    pub fn is_used(&self, index: u32) -> bool {
        if index >= self.total {
            return false;
        }
        self.bits[(index / 8) as usize] & (1 << (index % 8)) != 0
    }

    pub fn free_count(&self) -> u32 {
        self.free
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn load<S: BackingStore>(disk: &S, offset: u64, total: u32) -> Result<Self> {
        let mut flags = vec![0u8; total as usize];
        disk.read_at(offset, &mut flags)?;

        let mut bitmap = Self::new(total, offset);
        for (index, flag) in flags.iter().enumerate() {
            if *flag != 0 {
                bitmap.bits[index / 8] |= 1 << (index % 8);
                bitmap.free -= 1;
            }
        }
        Ok(bitmap)
    }

    // 将位图写回磁盘
    pub fn sync<S: BackingStore>(&self, disk: &S) -> Result<()> {
        let flags: Vec<u8> = (0..self.total).map(|i| self.is_used(i) as u8).collect();
        disk.write_at(self.offset, &flags)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::MemDisk;

    #[test]
    fn alloc_is_first_fit() {
        let mut bitmap = Bitmap::new(10, 0);
        assert_eq!(bitmap.alloc(), Some(0));
        assert_eq!(bitmap.alloc(), Some(1));
        assert_eq!(bitmap.alloc(), Some(2));
        assert!(bitmap.free(1));
        assert_eq!(bitmap.alloc(), Some(1));
        assert_eq!(bitmap.alloc(), Some(3));
        assert_eq!(bitmap.free_count(), 6);
    }

    #[test]
    fn never_hands_out_past_the_end() {
        // 10 项占两个字节，第二个字节只有低 2 位有效
        let mut bitmap = Bitmap::new(10, 0);
        for expected in 0..10 {
            assert_eq!(bitmap.alloc(), Some(expected));
        }
        assert_eq!(bitmap.alloc(), None);
        assert_eq!(bitmap.free_count(), 0);
    }

    #[test]
    fn double_free_is_ignored() {
        let mut bitmap = Bitmap::new(8, 0);
        bitmap.alloc();
        assert!(bitmap.free(0));
        assert!(!bitmap.free(0));
        assert!(!bitmap.free(42));
        assert_eq!(bitmap.free_count(), 8);
    }

    #[test]
    fn stored_one_byte_per_flag() {
        let disk = MemDisk::with_len(64);
        let mut bitmap = Bitmap::new(12, 16);
        bitmap.alloc();
        bitmap.alloc();
        bitmap.free(0);
        bitmap.sync(&disk).unwrap();

        let raw = disk.snapshot();
        assert_eq!(&raw[16..28], &[0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);

        let loaded = Bitmap::load(&disk, 16, 12).unwrap();
        assert_eq!(loaded, bitmap);
    }
}
