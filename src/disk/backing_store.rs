use std::io::Result;

/// 文件系统对底层存储的全部要求：按偏移读写 + 截断到固定大小。
/// 普通镜像文件、字符设备、内存盘都可以实现它。
pub trait BackingStore: Send {
    /// 从 `offset` 开始读满 `buf`，不足则返回 `UnexpectedEof`
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// 从 `offset` 开始写入整个 `buf`
    fn write_at(&self, offset: u64, buf: &[u8]) -> Result<()>;

    /// 把存储调整为 `size` 字节
    fn set_len(&self, size: u64) -> Result<()>;

    /// 当前容量（字节）
    fn len(&self) -> Result<u64>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
