pub mod detection;
pub mod export;
pub mod overlay;
pub mod pipeline;
pub mod preprocessing;
pub mod shared;
pub mod tracking;
pub mod video;
