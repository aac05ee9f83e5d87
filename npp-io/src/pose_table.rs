//! Camera pose tables exported from endoscopy datasets (CSV or XLSX)

use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};
use csv::{ReaderBuilder, Writer};
use log::{debug, warn};
use npp_core::{CameraPose, RecordError};

use crate::error::{IoError, Result};

/// Names of the seven pose columns, in order
pub const POSE_COLUMNS: [&str; 7] = [
    "trans_x", "trans_y", "trans_z", "quot_x", "quot_y", "quot_z", "quot_w",
];

/// Header written by [`write_pose_csv`]
pub const HEADER: [&str; 10] = [
    "", "ImageFrame", "Pose_Index", "trans_x", "trans_y", "trans_z", "quot_x", "quot_y", "quot_z",
    "quot_w",
];

/// One row of a pose table
#[derive(Debug, Clone, PartialEq)]
pub struct PoseRecord {
    pub frame: usize,
    /// `ImageFrame` column, when the table has one
    pub image_frame: Option<f64>,
    /// `Pose_Index` column, when the table has one
    pub pose_index: Option<f64>,
    pub pose: CameraPose,
}

impl PoseRecord {
    pub fn new(frame: usize, pose: CameraPose) -> Self {
        Self {
            frame,
            image_frame: None,
            pose_index: None,
            pose,
        }
    }
}

/// Positions of the named columns in a header row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Columns {
    /// Column of `trans_x`
    pose: Option<usize>,
    image_frame: Option<usize>,
    pose_index: Option<usize>,
}

impl Columns {
    fn from_header(header: &[String]) -> Self {
        let find = |wanted: &str| header.iter().position(|name| name.trim() == wanted);
        Self {
            pose: find(POSE_COLUMNS[0]),
            image_frame: find(HEADER[1]),
            pose_index: find(HEADER[2]),
        }
    }
}

/// Build a record from the numeric cells of one data row
///
/// `position` is the zero-based data row; error rows are reported 1-based
/// including the header, as a spreadsheet shows them. Without a `trans_x`
/// header the pose is taken from the last seven columns.
fn parse_record(
    position: usize,
    cells: &[Option<f64>],
    columns: Columns,
) -> std::result::Result<PoseRecord, RecordError> {
    let row = position + 2;
    let offset = match columns.pose {
        Some(offset) => offset,
        None => {
            cells.len().checked_sub(POSE_COLUMNS.len()).ok_or_else(|| RecordError::Malformed {
                row,
                reason: format!("expected at least 7 columns, found {}", cells.len()),
            })?
        }
    };

    let mut values = [0.0; 7];
    for (i, value) in values.iter_mut().enumerate() {
        *value = cells
            .get(offset + i)
            .copied()
            .flatten()
            .ok_or_else(|| RecordError::Malformed {
                row,
                reason: format!("{} is missing or not a number", POSE_COLUMNS[i]),
            })?;
    }

    let frame = match cells.first().copied().flatten() {
        Some(index) if offset > 0 && index >= 0.0 && index.fract() == 0.0 => index as usize,
        _ => position,
    };

    let cell = |column: Option<usize>| column.and_then(|c| cells.get(c).copied().flatten());
    Ok(PoseRecord {
        frame,
        image_frame: cell(columns.image_frame),
        pose_index: cell(columns.pose_index),
        pose: CameraPose::from_row(&values),
    })
}

fn cell_value(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(v) => Some(*v),
        Data::Int(v) => Some(*v as f64),
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn warn_if_short(records: &[PoseRecord], limit: Option<usize>) {
    if let Some(limit) = limit {
        if records.len() < limit {
            warn!("requested {} poses but the table only has {}", limit, records.len());
        }
    }
}

/// Read up to `limit` poses from a CSV file, skipping the header row
pub fn read_pose_csv<P: AsRef<Path>>(path: P, limit: Option<usize>) -> Result<Vec<PoseRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path.as_ref())?;

    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let columns = Columns::from_header(&header);
    debug!("CSV columns: {:?}", columns);

    let mut records = Vec::new();
    for (position, row) in reader
        .records()
        .take(limit.unwrap_or(usize::MAX))
        .enumerate()
    {
        let row = row?;
        let cells: Vec<Option<f64>> = row.iter().map(|cell| cell.trim().parse().ok()).collect();
        records.push(parse_record(position, &cells, columns)?);
    }

    warn_if_short(&records, limit);
    Ok(records)
}

/// Read up to `limit` poses from the first worksheet of an XLSX file
pub fn read_pose_xlsx<P: AsRef<Path>>(path: P, limit: Option<usize>) -> Result<Vec<PoseRecord>> {
    let mut workbook: Xlsx<_> = open_workbook(path.as_ref())?;
    let range = workbook.worksheet_range_at(0).ok_or(IoError::NoWorksheet)??;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .unwrap_or_default();
    let columns = Columns::from_header(&header);
    debug!("XLSX columns: {:?}", columns);

    let mut records = Vec::new();
    for (position, row) in rows.take(limit.unwrap_or(usize::MAX)).enumerate() {
        let cells: Vec<Option<f64>> = row.iter().map(cell_value).collect();
        records.push(parse_record(position, &cells, columns)?);
    }

    warn_if_short(&records, limit);
    Ok(records)
}

/// Write poses with the dataset header `["", ImageFrame, Pose_Index, trans_x, ..., quot_w]`
///
/// `ImageFrame` and `Pose_Index` keep the values read from the source table;
/// records without them get the frame index and the output row.
pub fn write_pose_csv<P: AsRef<Path>>(path: P, records: &[PoseRecord]) -> Result<()> {
    let mut writer = Writer::from_path(path.as_ref())?;
    writer.write_record(HEADER)?;

    for (position, record) in records.iter().enumerate() {
        let image_frame = record.image_frame.unwrap_or(record.frame as f64);
        let pose_index = record.pose_index.unwrap_or(position as f64);
        let mut fields = vec![
            record.frame.to_string(),
            image_frame.to_string(),
            pose_index.to_string(),
        ];
        fields.extend(record.pose.to_row().iter().map(|v| v.to_string()));
        writer.write_record(&fields)?;
    }

    writer.flush()?;
    Ok(())
}
