pub mod background_model_factory;
pub mod first_frame_background_model;
pub mod mog2_background_model;
