use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use minifs::{
    cli::{init_logging, GeometryArgs},
    disk::init::open_image,
    shell::start_shell,
};

/// Open (or create) a MiniFS image and work on it interactively.
#[derive(Parser, Debug)]
#[command(name = "minifs", version)]
struct Args {
    /// Image file to open, created and formatted when missing
    #[arg(default_value = "filesystem")]
    image: PathBuf,

    /// Format the image even if it already holds a file system
    #[arg(long)]
    format: bool,

    #[command(flatten)]
    geometry: GeometryArgs,
}

fn main() -> anyhow::Result<()> {
    init_logging("warn");
    let args = Args::parse();

    let fs = open_image(&args.image, args.geometry.into(), args.format)
        .with_context(|| format!("cannot open image {}", args.image.display()))?;

    let mut fs = start_shell(fs, "local")?;
    fs.sync().context("final sync failed")?;
    Ok(())
}
