//! Shared plumbing for the `npp-*` command line tools

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use npp_core::frustum::{merge_frustums, BLUE, ORANGE};
use npp_core::trajectory::{flip_and_lift, sample_every, FLIP_PITCH_DEG, LIFT_Z};
use npp_io::camera_dict::{
    frustums_from_camera_dict, write_camera_dict, DEFAULT_FOCAL, ORIGINAL_FILE, RECENTER_FILE,
};
use npp_io::pose_table::{read_pose_csv, read_pose_xlsx, write_pose_csv};
use npp_io::poses_bounds::{read_array, write_poses_bounds, FILE_NAME};
use npp_io::{export_camera_dicts, ConvertSettings, PoseRecord, PosesBounds};
use thiserror::Error;

pub type CliResult<T> = std::result::Result<T, Box<dyn Error>>;

#[derive(Error, Debug, PartialEq)]
pub enum CliError {
    #[error("no pose table given, pass --xlsx or --csv")]
    NoInput,
}

/// Frustum depth used for line-set exports
pub const FRUSTUM_LENGTH: f64 = 0.1;

pub const ORIGINAL_FRUSTUMS_FILE: &str = "frustums_original.json";
pub const RECENTER_FRUSTUMS_FILE: &str = "frustums_recenter.json";

/// Route `log` output to stderr, `info` unless `RUST_LOG` says otherwise
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Where a pose table comes from
#[derive(Debug, Clone, PartialEq)]
pub enum PoseSource {
    Csv(PathBuf),
    Xlsx(PathBuf),
}

impl PoseSource {
    /// Pick the source given on the command line, if any
    pub fn from_args(csv: Option<PathBuf>, xlsx: Option<PathBuf>) -> Option<Self> {
        xlsx.map(PoseSource::Xlsx).or(csv.map(PoseSource::Csv))
    }

    /// Like [`PoseSource::from_args`], failing when neither path is given
    pub fn require(csv: Option<PathBuf>, xlsx: Option<PathBuf>) -> Result<Self, CliError> {
        Self::from_args(csv, xlsx).ok_or(CliError::NoInput)
    }

    pub fn read(&self, limit: Option<usize>) -> npp_io::Result<Vec<PoseRecord>> {
        match self {
            PoseSource::Csv(path) => read_pose_csv(path, limit),
            PoseSource::Xlsx(path) => read_pose_xlsx(path, limit),
        }
    }
}

pub fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> CliResult<T> {
    let data = fs::read_to_string(path)?;
    let value = serde_json::from_str(&data)?;
    Ok(value)
}

/// Defaults, then the JSON config file, then the `--frames` flag
pub fn load_settings(config: Option<&Path>, frames: Option<usize>) -> CliResult<ConvertSettings> {
    let mut settings = match config {
        Some(path) => load_json_file::<ConvertSettings>(path)?,
        None => ConvertSettings::default(),
    };
    if let Some(frames) = frames {
        settings.frames = frames;
    }
    Ok(settings)
}

/// Convert a pose table into `<output_dir>/poses_bounds.npy`
pub fn convert_file(
    source: &PoseSource,
    output_dir: &Path,
    settings: &ConvertSettings,
) -> CliResult<PathBuf> {
    let records = source.read(Some(settings.frames))?;
    let poses_bounds = PosesBounds::from_records(&records, settings);

    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(FILE_NAME);
    write_poses_bounds(&path, &poses_bounds)?;
    Ok(path)
}

/// Rows of a poses/bounds file followed by its shape
pub fn inspect_npy(path: &Path) -> CliResult<String> {
    let array = read_array(path)?;

    let mut text = String::new();
    for row in array.rows() {
        let values: Vec<String> = row.iter().map(|v| format!("{v:.6}")).collect();
        text.push_str(&format!("[{}]\n", values.join(", ")));
    }
    text.push_str(&format!("shape: {:?}\n", array.shape()));
    Ok(text)
}

/// Write original and recentered camera dictionaries, and their frustums on request
///
/// Returns the written paths.
pub fn export_cameras(
    npy: &Path,
    output_dir: &Path,
    focal: Option<f64>,
    frustums: bool,
) -> CliResult<Vec<PathBuf>> {
    let poses_bounds = npp_io::poses_bounds::read_poses_bounds(npy)?;
    fs::create_dir_all(output_dir)?;

    let focal = focal.or(Some(DEFAULT_FOCAL));
    let mut written = Vec::new();
    for (recenter, dict_file, frustum_file, color) in [
        (false, ORIGINAL_FILE, ORIGINAL_FRUSTUMS_FILE, ORANGE),
        (true, RECENTER_FILE, RECENTER_FRUSTUMS_FILE, BLUE),
    ] {
        let dict = export_camera_dicts(&poses_bounds, focal, recenter)?;
        let path = output_dir.join(dict_file);
        write_camera_dict(&path, &dict)?;
        written.push(path);

        if frustums {
            let frustums = frustums_from_camera_dict(&dict, FRUSTUM_LENGTH, color)?;
            let line_set = merge_frustums(&frustums);
            let path = output_dir.join(frustum_file);
            fs::write(&path, serde_json::to_string(&line_set)?)?;
            info!(
                "Wrote {} frustum lines to {}",
                line_set.lines.len(),
                path.display()
            );
            written.push(path);
        }
    }
    Ok(written)
}

/// Keep every `step`-th frame, flip and lift the cameras, and save them as CSV
///
/// `ImageFrame` and `Pose_Index` values of the source rows are kept.
pub fn sample_poses(
    source: &PoseSource,
    step: usize,
    count: usize,
    output: &Path,
) -> CliResult<Vec<PoseRecord>> {
    let records = source.read(None)?;
    let sampled: Vec<PoseRecord> = sample_every(&records, |r| r.frame, step, count)?
        .into_iter()
        .map(|r| PoseRecord {
            pose: flip_and_lift(&r.pose, FLIP_PITCH_DEG, LIFT_Z),
            ..r
        })
        .collect();

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_pose_csv(output, &sampled)?;
    info!("Wrote {} sampled poses to {}", sampled.len(), output.display());
    Ok(sampled)
}
