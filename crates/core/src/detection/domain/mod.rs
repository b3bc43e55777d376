pub mod blob_detector;
pub mod detection;
