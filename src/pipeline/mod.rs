pub mod frame_loop;
pub mod orchestration;
pub mod services;
pub mod steps;
pub mod types;

pub use frame_loop::{CycleOutcome, FrameLoop, SessionCommand, SessionObserver, SessionSnapshot};
pub use types::{AngleSample, ExerciseKind, FrameUpdate, KeypointFrame, KeypointName, Landmark};
