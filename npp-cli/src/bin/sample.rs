use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use npp_cli::{init_logging, sample_poses, CliResult, PoseSource};

/// Sample every N-th camera of a pose table, turn it upside down and lift it.
#[derive(Debug, Parser)]
#[command(author, version, about = "Pose table sampler")]
struct Args {
    /// Path to a poses spreadsheet (XLSX)
    #[arg(long, conflicts_with = "csv")]
    xlsx: Option<PathBuf>,

    /// Path to a poses CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Keep frames whose index is a multiple of this
    #[arg(long)]
    step: usize,

    /// Number of poses to keep
    #[arg(long, default_value_t = 20)]
    count: usize,

    /// Output CSV, defaults to sampled_poses_step<N>.csv
    #[arg(long)]
    output: Option<PathBuf>,
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

    let source = match PoseSource::require(args.csv, args.xlsx) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{}", Args::command().render_help());
            return Err(err.into());
        }
    };

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("sampled_poses_step{}.csv", args.step)));
    sample_poses(&source, args.step, args.count, &output)?;
    Ok(())
}
