pub const DEFAULT_CANNY_LOWER: u32 = 85;
pub const DEFAULT_CANNY_UPPER: u32 = 255;

/// Max distance (px) an object may travel between two matched frames.
pub const DEFAULT_MAX_CENTROID_DISTANCE: u32 = 70;

/// Frames without a match before a track is considered gone.
pub const DEFAULT_TIMEOUT: u32 = 5;

/// Padding (px) added to enclosing circles during overlap merging.
pub const DEFAULT_CELL_RADIUS: u32 = 6;

/// Blobs wider or taller than `cell_radius * SIZE_FILTER_FACTOR` are rejected.
pub const SIZE_FILTER_FACTOR: i32 = 10;

/// Frames per processing batch; only bounds buffer lifetime.
pub const DEFAULT_BATCH_SIZE: usize = 100;

pub const DEFAULT_RESULTS_DIR: &str = "results/";

pub const FRAME_EXTENSIONS: &[&str] = &["png", "tif", "tiff", "jpg", "jpeg", "bmp"];

pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const SETTINGS_DIR_NAME: &str = "cellcount";
