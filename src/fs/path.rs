//! 路径处理。所有函数都只借用输入，不修改原字符串。

use crate::fs::error::{FsError, Result};

/// 按 '/' 切分，跳过空段：`"//a///b/"` 得到 `a`、`b`
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// 拆成（父目录路径，最后一级名字）
///
/// 末尾多余的 '/' 会被忽略；没有分隔符的路径（例如裸文件名或 "/"）视为非法。
pub fn split(path: &str) -> Result<(&str, &str)> {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        None => Err(FsError::MalformedPath(path.to_string())),
        Some(0) => Ok(("/", &trimmed[1..])),
        Some(sep) => Ok((&trimmed[..sep], &trimmed[sep + 1..])),
    }
}
