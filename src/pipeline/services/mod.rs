pub mod angle_extractor;
pub mod correctness;
pub mod frame_publish;
pub mod session_tracker;

pub use angle_extractor::{AngleMode, ExtractionOptions, extract_angle};
pub use correctness::{AngleBand, ExerciseProfile, ProfileRegistry, classify};
pub use frame_publish::UpdatePublishingService;
pub use session_tracker::{SessionHandle, SessionStats, SessionSummary, SessionTracker};
