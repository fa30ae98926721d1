use std::fmt;

use crate::fs::inode_table::InodeType;

/// 分配失败时耗尽的资源池
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    Inodes,
    Blocks,
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inodes => f.write_str("inodes"),
            Self::Blocks => f.write_str("data blocks"),
        }
    }
}

/// 文件系统错误类型
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("disk I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no such file or directory: {0}")]
    NotFound(String),

    #[error("{path}: not a {expected}")]
    WrongType { path: String, expected: InodeType },

    #[error("file would grow to {requested} bytes, the limit is {limit}")]
    CapacityExceeded { requested: usize, limit: usize },

    #[error("no free {0} left")]
    PoolExhausted(Pool),

    #[error("invalid path: {0}")]
    MalformedPath(String),

    #[error("file system corrupted: {0}")]
    CorruptImage(String),

    #[error("invalid inode: {0}")]
    InvalidInode(u32),
}

// bincode 解不出来的记录只能说明镜像坏了
impl From<bincode::Error> for FsError {
    fn from(e: bincode::Error) -> Self {
        FsError::CorruptImage(e.to_string())
    }
}

/// 文件系统统一结果类型
pub type Result<T> = std::result::Result<T, FsError>;
