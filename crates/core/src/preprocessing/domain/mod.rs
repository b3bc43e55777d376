pub mod background_model;
pub mod frame_preprocessor;
