use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use npp_cli::{convert_file, init_logging, inspect_npy, load_settings, CliResult, PoseSource};

/// Convert a camera pose table into the poses_bounds.npy array used for NeRF training.
#[derive(Debug, Parser)]
#[command(author, version, about = "Pose table to poses_bounds.npy converter")]
struct Args {
    /// Path to a poses spreadsheet (XLSX)
    #[arg(long, conflicts_with_all = ["csv", "npy"])]
    xlsx: Option<PathBuf>,

    /// Path to a poses CSV file
    #[arg(long, conflicts_with = "npy")]
    csv: Option<PathBuf>,

    /// Directory to place the produced poses_bounds.npy file
    #[arg(long)]
    output: Option<PathBuf>,

    /// Number of leading poses to convert
    #[arg(long)]
    frames: Option<usize>,

    /// Optional JSON file with conversion settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the contents of an existing poses_bounds.npy file
    #[arg(long)]
    npy: Option<PathBuf>,
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

    if let Some(npy) = &args.npy {
        print!("{}", inspect_npy(npy)?);
        return Ok(());
    }

    let source = match PoseSource::require(args.csv, args.xlsx) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{}", Args::command().render_help());
            return Err(err.into());
        }
    };

    let settings = load_settings(args.config.as_deref(), args.frames)?;
    let output = match args.output {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    convert_file(&source, &output, &settings)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use npp_cli::CliError;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_no_table_is_a_usage_error() {
        let args = Args::try_parse_from(["npp-convert", "--frames", "5"]).unwrap();
        assert_eq!(
            PoseSource::require(args.csv, args.xlsx),
            Err(CliError::NoInput)
        );

        let help = Args::command().render_help().to_string();
        assert!(help.contains("--xlsx"));
        assert!(help.contains("--csv"));
    }

    #[test]
    fn test_xlsx_conflicts_with_csv() {
        let result = Args::try_parse_from(["npp-convert", "--xlsx", "a.xlsx", "--csv", "b.csv"]);
        assert!(result.is_err());
    }
}
