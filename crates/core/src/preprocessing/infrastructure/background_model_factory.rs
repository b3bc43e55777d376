use crate::preprocessing::domain::background_model::{BackgroundMethod, BackgroundModel};
use crate::preprocessing::infrastructure::first_frame_background_model::FirstFrameBackgroundModel;
use crate::preprocessing::infrastructure::mog2_background_model::Mog2BackgroundModel;

/// Creates a fresh background model. One model per sequence.
pub fn create_background_model(method: BackgroundMethod) -> Box<dyn BackgroundModel> {
    log::debug!("Using {method:?} background model");
    match method {
        BackgroundMethod::Mog2 => Box::new(Mog2BackgroundModel::new()),
        BackgroundMethod::FirstFrame => Box::new(FirstFrameBackgroundModel::default()),
    }
}
