//! 三个可执行文件共用的命令行参数和日志初始化

use clap::Args;

use crate::fs::config::{Geometry, DEFAULT_BLOCK_COUNT, DEFAULT_BLOCK_SIZE, DEFAULT_INODE_COUNT};

/// 只在格式化新镜像时生效；挂载已有镜像时以超级块为准
#[derive(Args, Debug, Clone, Copy)]
pub struct GeometryArgs {
    /// Number of data blocks
    #[arg(long, default_value_t = DEFAULT_BLOCK_COUNT)]
    pub blocks: u32,

    /// Number of inodes
    #[arg(long, default_value_t = DEFAULT_INODE_COUNT)]
    pub inodes: u32,

    /// Block size in bytes (a multiple of 16)
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
    pub block_size: u32,
}

impl From<GeometryArgs> for Geometry {
    fn from(args: GeometryArgs) -> Self {
        Self {
            block_count: args.blocks,
            inode_count: args.inodes,
            block_size: args.block_size,
        }
    }
}

/// `RUST_LOG` 优先，没设置时用 `default_level`
pub fn init_logging(default_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Probe {
        #[command(flatten)]
        geometry: GeometryArgs,
    }

    #[test]
    fn defaults_match_the_standard_geometry() {
        let probe = Probe::parse_from(["probe"]);
        assert_eq!(Geometry::from(probe.geometry), Geometry::default());
    }

    #[test]
    fn flags_override_geometry() {
        let probe = Probe::parse_from(["probe", "--blocks", "128", "--block-size", "512"]);
        let geometry = Geometry::from(probe.geometry);
        assert_eq!(geometry.block_count, 128);
        assert_eq!(geometry.block_size, 512);
        assert_eq!(geometry.inode_count, DEFAULT_INODE_COUNT);
    }
}
