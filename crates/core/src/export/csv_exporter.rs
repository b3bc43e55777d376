use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::pipeline::sequence_result::DetectionRecord;
use crate::shared::bounding_box::BoundingBox;
use crate::tracking::domain::outlet::OutletClassification;
use crate::tracking::domain::tracked_object::TrackedObject;

const RESULT_HEADER: [&str; 8] = [
    "object_id",
    "x_pos",
    "y_pos",
    "x_size",
    "y_size",
    "most_recent_frame",
    "frames_tracked",
    "DEP_response",
];

const TRAJECTORY_HEADER: [&str; 6] = ["frame", "object_id", "x_pos", "y_pos", "x_size", "y_size"];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to create {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write CSV {path}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Counts reported after writing a result file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportSummary {
    pub counted: usize,
    pub responsive: usize,
    pub non_responsive: usize,
}

#[derive(Serialize)]
struct ResultRow {
    object_id: u32,
    x_pos: i32,
    y_pos: i32,
    x_size: i32,
    y_size: i32,
    most_recent_frame: usize,
    frames_tracked: u32,
    dep_response: &'static str,
}

impl From<&TrackedObject> for ResultRow {
    fn from(obj: &TrackedObject) -> Self {
        let bbox = obj.bbox();
        Self {
            object_id: obj.id(),
            x_pos: bbox.x,
            y_pos: bbox.y,
            x_size: bbox.width,
            y_size: bbox.height,
            most_recent_frame: obj.most_recent_frame(),
            frames_tracked: obj.frames_tracked(),
            dep_response: match obj.outlet().as_flag() {
                Some(true) => "True",
                Some(false) => "False",
                None => "",
            },
        }
    }
}

#[derive(Serialize)]
struct TrajectoryRow {
    frame: usize,
    object_id: u32,
    x_pos: i32,
    y_pos: i32,
    x_size: i32,
    y_size: i32,
}

impl TrajectoryRow {
    fn new(frame: usize, object_id: u32, bbox: BoundingBox) -> Self {
        Self {
            frame,
            object_id,
            x_pos: bbox.x,
            y_pos: bbox.y,
            x_size: bbox.width,
            y_size: bbox.height,
        }
    }
}

/// Writes one row per tracked object, in the order given.
pub fn write_results(path: &Path, objects: &[TrackedObject]) -> Result<ExportSummary, ExportError> {
    let mut writer = open(path, &RESULT_HEADER)?;
    let mut summary = ExportSummary::default();
    for obj in objects {
        writer
            .serialize(ResultRow::from(obj))
            .map_err(|e| csv_error(path, e))?;
        summary.counted += 1;
        match obj.outlet() {
            OutletClassification::Responsive => summary.responsive += 1,
            OutletClassification::NonResponsive => summary.non_responsive += 1,
            OutletClassification::Unclassified => {}
        }
    }
    finish(path, writer)?;
    Ok(summary)
}

/// Writes every trajectory point of every object, object by object.
pub fn write_trajectories(path: &Path, objects: &[TrackedObject]) -> Result<usize, ExportError> {
    let mut writer = open(path, &TRAJECTORY_HEADER)?;
    let mut rows = 0;
    for obj in objects {
        for point in obj.trajectory() {
            writer
                .serialize(TrajectoryRow::new(point.frame, obj.id(), point.bbox))
                .map_err(|e| csv_error(path, e))?;
            rows += 1;
        }
    }
    finish(path, writer)?;
    Ok(rows)
}

/// Writes the assignment log in the order detections were assigned, with
/// the trajectory columns.
pub fn write_history(path: &Path, history: &[DetectionRecord]) -> Result<usize, ExportError> {
    let mut writer = open(path, &TRAJECTORY_HEADER)?;
    for record in history {
        writer
            .serialize(TrajectoryRow::new(record.frame, record.object_id, record.bbox))
            .map_err(|e| csv_error(path, e))?;
    }
    finish(path, writer)?;
    Ok(history.len())
}

/// Header written up front so an empty result still yields a valid file.
fn open(path: &Path, header: &[&str]) -> Result<csv::Writer<File>, ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ExportError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;
    writer.write_record(header).map_err(|e| csv_error(path, e))?;
    Ok(writer)
}

fn finish(path: &Path, mut writer: csv::Writer<File>) -> Result<(), ExportError> {
    writer.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn csv_error(path: &Path, source: csv::Error) -> ExportError {
    ExportError::Csv {
        path: path.to_path_buf(),
        source,
    }
}
