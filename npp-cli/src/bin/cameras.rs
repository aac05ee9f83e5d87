use std::path::PathBuf;

use clap::Parser;
use npp_cli::{export_cameras, init_logging, CliResult};

/// Export per-camera K/W2C dictionaries from a poses_bounds.npy file.
#[derive(Debug, Parser)]
#[command(author, version, about = "Camera dictionaries and frustums from poses_bounds.npy")]
struct Args {
    /// Path to poses_bounds.npy
    #[arg(long)]
    npy: PathBuf,

    /// Directory for camera_original.json and camera_recenter.json
    #[arg(long, default_value = ".")]
    output: PathBuf,

    /// Focal length to use instead of the stored one (680 when omitted)
    #[arg(long)]
    focal: Option<f64>,

    /// Also write the merged frustum line sets
    #[arg(long)]
    frustums: bool,
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn try_main() -> CliResult<()> {
    init_logging();
    let args = Args::parse();

    for path in export_cameras(&args.npy, &args.output, args.focal, args.frustums)? {
        println!("{}", path.display());
    }
    Ok(())
}
