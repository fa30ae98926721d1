use std::path::Path;

use log::{info, warn};

use crate::{
    disk::{BackingStore, FileDisk},
    fs::{
        config::{Geometry, SUPER_BLOCK_OFFSET, SUPER_BLOCK_SIZE},
        error::{FsError, Result},
        FileSystem,
    },
};

/// 启动时挂载镜像：
/// - 明确要求格式化，或者从开头到超级块末尾全是 0（新盘 / 新设备）时格式化；
/// - 否则按已有文件系统挂载，太短或魔数不对直接报错，不会覆盖别人的数据。
pub fn open_image(
    path: impl AsRef<Path>,
    geometry: Geometry,
    force_format: bool,
) -> Result<FileSystem<FileDisk>> {
    let path = path.as_ref();
    let disk = FileDisk::open(path)?;

    if force_format {
        info!("formatting {} as requested", path.display());
        return FileSystem::format(disk, geometry);
    }

    if is_blank(&disk)? {
        // 只有“明确是新磁盘”才格式化
        warn!("no file system found on {}, formatting", path.display());
        return FileSystem::format(disk, geometry);
    }

    if disk.len()? < SUPER_BLOCK_OFFSET + SUPER_BLOCK_SIZE {
        return Err(FsError::CorruptImage(format!(
            "{} is too small to hold a file system",
            path.display()
        )));
    }

    info!("mounting {}", path.display());
    FileSystem::mount(disk)
}

/// 空文件，或者已有的字节（最多到超级块末尾）全是 0
fn is_blank<S: BackingStore>(disk: &S) -> Result<bool> {
    let len = disk.len()?.min(SUPER_BLOCK_OFFSET + SUPER_BLOCK_SIZE);
    let mut buf = vec![0u8; len as usize];
    disk.read_at(0, &mut buf)?;
    Ok(buf.iter().all(|b| *b == 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::inode_table::InodeType;

    #[test]
    fn new_image_is_formatted_then_reopened() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("filesystem");

        let mut fs = open_image(&image, Geometry::default(), false).unwrap();
        fs.create_entry("/keep", InodeType::File, Some(b"persisted"))
            .unwrap();
        drop(fs);

        let fs = open_image(&image, Geometry::default(), false).unwrap();
        assert_eq!(fs.read_path("/keep").unwrap(), b"persisted");

        let fs = open_image(&image, Geometry::default(), true).unwrap();
        assert!(matches!(fs.resolve("/keep"), Err(FsError::NotFound(_))));
    }

    #[test]
    fn foreign_data_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("foreign.img");
        std::fs::write(&image, vec![0xAB; 9000]).unwrap();

        assert!(matches!(
            open_image(&image, Geometry::default(), false),
            Err(FsError::CorruptImage(_))
        ));
        assert_eq!(std::fs::read(&image).unwrap(), vec![0xAB; 9000]);
    }

    #[test]
    fn short_foreign_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, vec![0xAB; 500]).unwrap();

        assert!(matches!(
            open_image(&notes, Geometry::default(), false),
            Err(FsError::CorruptImage(_))
        ));
        assert_eq!(std::fs::read(&notes).unwrap(), vec![0xAB; 500]);
    }

    #[test]
    fn short_zero_file_counts_as_blank() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("zeros.img");
        std::fs::write(&image, vec![0u8; 500]).unwrap();

        let fs = open_image(&image, Geometry::default(), false).unwrap();
        assert!(fs.list_dir("/").unwrap().is_empty());
    }
}
