use std::collections::HashSet;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    disk::BackingStore,
    fs::{
        config::{DIR_ENTRY_SIZE, MAX_NAME_LEN, NAME_LEN, ROOT_INODE},
        error::{FsError, Result},
        inode_table::{Inode, InodeType},
        path, FileSystem, Metadata,
    },
};

/// 一个目录项：inode 号 + 以 '\0' 结尾的名字，共 16 字节
///
/// 目录的内容就是一串紧挨着的目录项，没有 "." 和 ".."。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub inode_index: u32,
    name: [u8; NAME_LEN],
}

impl DirEntry {
    pub fn new(inode_index: u32, name: &str) -> Result<Self> {
        let bytes = name.as_bytes();
        if bytes.is_empty() || bytes.len() > MAX_NAME_LEN || bytes.contains(&0) {
            return Err(FsError::MalformedPath(format!(
                "{name:?}: names must be 1 to {MAX_NAME_LEN} bytes"
            )));
        }

        let mut buf = [0u8; NAME_LEN];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            inode_index,
            name: buf,
        })
    }

    pub fn name_bytes(&self) -> &[u8] {
        let end = self
            .name
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(NAME_LEN);
        &self.name[..end]
    }

    pub fn name(&self) -> String {
        String::from_utf8_lossy(self.name_bytes()).into_owned()
    }

    // 区分大小写的精确匹配
    pub fn matches(&self, name: &str) -> bool {
        self.name_bytes() == name.as_bytes()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// 把目录内容解析成目录项
    pub fn parse_all(bytes: &[u8]) -> Result<Vec<Self>> {
        if bytes.len() % DIR_ENTRY_SIZE != 0 {
            return Err(FsError::CorruptImage(format!(
                "directory length {} is not a multiple of {DIR_ENTRY_SIZE}",
                bytes.len()
            )));
        }
        bytes
            .chunks_exact(DIR_ENTRY_SIZE)
            .map(|chunk| bincode::deserialize::<DirEntry>(chunk).map_err(FsError::from))
            .collect()
    }
}

impl<S: BackingStore> FileSystem<S> {
    fn expect_type(&self, index: u32, path: &str, expected: InodeType) -> Result<&Inode> {
        let inode = self.inode(index)?;
        if inode.inode_type != expected {
            return Err(FsError::WrongType {
                path: path.to_string(),
                expected,
            });
        }
        Ok(inode)
    }

    pub fn read_dir(&self, index: u32) -> Result<Vec<DirEntry>> {
        DirEntry::parse_all(&self.read_file(index)?)
    }

    /// 从根目录开始逐级查找，返回 inode 号；同名项取第一个
    pub fn resolve(&self, path: &str) -> Result<u32> {
        let mut current = ROOT_INODE;
        for segment in path::segments(path) {
            if !self.inode(current)?.is_dir() {
                return Err(FsError::NotFound(path.to_string()));
            }
            current = self
                .read_dir(current)?
                .iter()
                .find(|entry| entry.matches(segment))
                .map(|entry| entry.inode_index)
                .ok_or_else(|| FsError::NotFound(path.to_string()))?;
        }
        Ok(current)
    }

    pub fn stat(&self, path: &str) -> Result<Metadata> {
        self.metadata(self.resolve(path)?)
    }

    /// 列出目录下的名字（按目录项顺序）
    pub fn list_dir(&self, path: &str) -> Result<Vec<String>> {
        let index = self.resolve(path)?;
        self.expect_type(index, path, InodeType::Directory)?;
        Ok(self.read_dir(index)?.iter().map(DirEntry::name).collect())
    }

    /// 读取普通文件的全部内容
    pub fn read_path(&self, path: &str) -> Result<Vec<u8>> {
        let index = self.resolve(path)?;
        self.expect_type(index, path, InodeType::File)?;
        self.read_file(index)
    }

    /// 在 `path` 处新建文件或目录，可以带初始内容
    ///
    /// 任何一步失败都会把新分配的 inode 还回去。同名项不做检查。
    pub fn create_entry(
        &mut self,
        path: &str,
        inode_type: InodeType,
        content: Option<&[u8]>,
    ) -> Result<u32> {
        let (base, leaf) = path::split(path)?;
        let mut entry = DirEntry::new(ROOT_INODE, leaf)?;

        let parent = self.resolve(base)?;
        self.expect_type(parent, base, InodeType::Directory)?;

        let index = self.alloc_inode(inode_type)?;
        entry.inode_index = index;

        let mut written = match content {
            Some(content) => self.append(index, content),
            None => Ok(()),
        };
        if written.is_ok() {
            written = entry
                .to_bytes()
                .and_then(|bytes| self.append(parent, &bytes));
        }

        if let Err(e) = written {
            if let Err(rollback) = self.free_inode(index) {
                warn!("could not release inode {index} after failed create: {rollback}");
            }
            return Err(e);
        }

        self.sync()?;
        debug!("created {inode_type} {path} as inode {index}");
        Ok(index)
    }

    /// 删除目录项以及它下面的整棵子树
    pub fn remove_entry(&mut self, path: &str) -> Result<()> {
        self.remove_entry_checked(path, None)
    }

    /// 同 `remove_entry`，但要求目标是 `expected` 类型
    pub fn remove_entry_checked(&mut self, path: &str, expected: Option<InodeType>) -> Result<()> {
        let (base, leaf) = path::split(path)?;
        let parent = self.resolve(base)?;
        self.expect_type(parent, base, InodeType::Directory)?;

        let entries = self.read_dir(parent)?;
        let slot = entries
            .iter()
            .position(|entry| entry.matches(leaf))
            .ok_or_else(|| FsError::NotFound(path.to_string()))?;
        let target = entries[slot].inode_index;

        if target == ROOT_INODE {
            return Err(FsError::MalformedPath(path.to_string()));
        }
        if let Some(expected) = expected {
            self.expect_type(target, path, expected)?;
        }

        // 后面的目录项整体前移一格，再把目录截短一项
        let mut shifted = Vec::with_capacity((entries.len() - slot - 1) * DIR_ENTRY_SIZE);
        for entry in &entries[slot + 1..] {
            shifted.extend_from_slice(&entry.to_bytes()?);
        }
        self.write_at(parent, slot * DIR_ENTRY_SIZE, &shifted)?;
        self.truncate(parent, (entries.len() - 1) * DIR_ENTRY_SIZE)?;

        self.remove_subtree(target)?;
        self.sync()?;
        debug!("removed {path} (inode {target})");
        Ok(())
    }

    /// 释放以 `index` 为根的整棵子树，子节点先于父节点释放
    ///
    /// 用显式栈代替递归；已经访问过的 inode 和根目录都会被跳过，
    /// 损坏的镜像里即使有环也不会死循环。
    pub fn remove_subtree(&mut self, index: u32) -> Result<()> {
        let mut stack = vec![index];
        let mut seen = HashSet::new();
        let mut order = Vec::new();

        while let Some(current) = stack.pop() {
            if current == ROOT_INODE || !seen.insert(current) {
                continue;
            }
            order.push(current);
            if self.inode(current)?.is_dir() {
                stack.extend(self.read_dir(current)?.iter().map(|e| e.inode_index));
            }
        }

        for current in order.into_iter().rev() {
            self.free_inode(current)?;
        }
        Ok(())
    }
}
