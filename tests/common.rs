//! 集成测试共用的小工具

#![allow(dead_code)]

use minifs::{FileSystem, Geometry, MemDisk};

/// 默认几何参数的内存文件系统
pub fn mem_fs() -> FileSystem<MemDisk> {
    FileSystem::format(MemDisk::new(), Geometry::default()).unwrap()
}

/// 测试用的二进制内容：所有字节值都有，包括换行和空白
pub fn binary(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 256) as u8).collect()
}
