pub mod canny_blob_detector;
pub mod math;
pub mod overlap_merger;
