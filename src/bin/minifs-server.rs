use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;
use minifs::{
    cli::{init_logging, GeometryArgs},
    disk::init::open_image,
    net::Server,
};

/// Serve a MiniFS image to remote clients over TCP.
#[derive(Parser, Debug)]
#[command(name = "minifs-server", version)]
struct Args {
    /// Image file backing the served file system
    #[arg(long, default_value = "minifs.img")]
    image: PathBuf,

    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// TCP port
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Format the image even if it already holds a file system
    #[arg(long)]
    format: bool,

    #[command(flatten)]
    geometry: GeometryArgs,
}

fn main() -> anyhow::Result<()> {
    init_logging("info");
    let args = Args::parse();

    let fs = open_image(&args.image, args.geometry.into(), args.format)
        .with_context(|| format!("cannot open image {}", args.image.display()))?;
    info!(
        "{}: {} free blocks, {} free inodes",
        args.image.display(),
        fs.free_blocks(),
        fs.free_inodes()
    );

    let server = Server::bind((args.bind.as_str(), args.port), fs)
        .with_context(|| format!("cannot listen on {}:{}", args.bind, args.port))?;
    server.serve()?;
    Ok(())
}
