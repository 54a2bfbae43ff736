use crate::pipeline::services::session_tracker::SessionHandle;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Emitted once per evaluated frame for rendering and persistence observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameUpdate {
    pub session: Option<SessionHandle>,
    pub angle_degrees: f64,
    pub valid: bool,
    pub is_correct: bool,
    /// Whether this frame advanced the session counters.
    pub recorded: bool,
    pub correct_count: u64,
    pub total_count: u64,
    pub timestamp: DateTime<Utc>,
}
