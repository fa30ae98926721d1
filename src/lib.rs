//! MiniFS：单个镜像文件里的小型 inode 文件系统，
//! 带本地交互 shell 和基于 TCP 的多用户远程访问。

pub mod cli;
pub mod disk;
pub mod fs;
pub mod net;
pub mod shell;

pub use disk::{BackingStore, FileDisk, MemDisk};
pub use fs::{config::Geometry, error::FsError, FileSystem};
