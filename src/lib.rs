pub mod config;
pub mod coordinator;
pub mod error;
pub mod journal;
pub mod oracle;
pub mod pipeline;

pub use config::Configuration;
pub use coordinator::{Coordinator, CoordinatorBuilder};
pub use error::{AppError, ConfigError, FrameError, OracleError, SessionError};
pub use journal::WorkoutJournal;
pub use oracle::{PoseOracle, ReplayOracle};
