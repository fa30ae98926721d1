pub mod backing_store;
pub mod file_disk;
pub mod init;
pub mod mem_disk;

pub use backing_store::BackingStore;
pub use file_disk::FileDisk;
pub use mem_disk::MemDisk;
