mod angle_sample;
mod exercise;
mod frame_update;
mod keypoint_frame;

pub use angle_sample::AngleSample;
pub use exercise::ExerciseKind;
pub use frame_update::FrameUpdate;
pub use keypoint_frame::{KeypointFrame, KeypointName, LANDMARK_COUNT, Landmark};
