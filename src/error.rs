use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),
    #[error("Oracle Error: {0}")]
    Oracle(#[from] OracleError),
    #[error("Frame Error: {0}")]
    Frame(#[from] FrameError),
    #[error("Session Error: {0}")]
    Session(#[from] SessionError),
    #[error("Journal Error: {0}")]
    Journal(String),
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task Error: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// Pose-estimation oracle failures. A failure only ever costs the current cycle.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Failed to read pose source: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode pose estimate on line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("Malformed pose estimate: {0}")]
    Frame(#[from] FrameError),
    #[error("Pose oracle unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Expected {expected} landmarks, got {actual}")]
    LandmarkCount { expected: usize, actual: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("The frame loop has stopped")]
    LoopStopped,
}
