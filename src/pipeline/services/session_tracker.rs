use crate::pipeline::types::ExerciseKind;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};
use uuid::Uuid;

/// Identifies one started session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionHandle(Uuid);

impl SessionHandle {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStats {
    pub exercise_kind: ExerciseKind,
    pub correct_count: u64,
    pub total_count: u64,
}

impl SessionStats {
    fn new(exercise_kind: ExerciseKind) -> Self {
        Self {
            exercise_kind,
            correct_count: 0,
            total_count: 0,
        }
    }

    /// Percentage of correct frames rounded to one decimal, 0 when empty.
    pub fn accuracy(&self) -> f64 {
        accuracy(self.correct_count, self.total_count)
    }
}

pub fn accuracy(correct_count: u64, total_count: u64) -> f64 {
    if total_count == 0 {
        return 0.0;
    }
    (correct_count as f64 * 1000.0 / total_count as f64).round() / 10.0
}

/// Final report handed out when a session ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub handle: SessionHandle,
    pub stats: SessionStats,
    pub accuracy: f64,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Active,
}

/// Running counters for the current (or most recently ended) session.
///
/// Only `start_session`, `record_frame` and `end_session` mutate it. Counters
/// stay readable after `end_session` until the next `start_session`.
#[derive(Debug, Clone)]
pub struct SessionTracker {
    state: SessionState,
    handle: Option<SessionHandle>,
    stats: Option<SessionStats>,
    started_at: Option<DateTime<Utc>>,
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionTracker {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            handle: None,
            stats: None,
            started_at: None,
        }
    }

    /// Starts a fresh session, discarding any previous counts.
    pub fn start_session(&mut self, exercise_kind: ExerciseKind) -> SessionHandle {
        let handle = SessionHandle::new();
        if self.state == SessionState::Active {
            info!(
                "Restarting active session {:?} as {} ({})",
                self.handle, handle, exercise_kind
            );
        } else {
            info!("Starting session {} ({})", handle, exercise_kind);
        }
        self.state = SessionState::Active;
        self.handle = Some(handle);
        self.stats = Some(SessionStats::new(exercise_kind));
        self.started_at = Some(Utc::now());
        handle
    }

    /// Returns `false` when the frame was dropped because no session is active.
    pub fn record_frame(&mut self, is_correct: bool) -> bool {
        if self.state != SessionState::Active {
            return false;
        }
        let Some(stats) = self.stats.as_mut() else {
            return false;
        };
        stats.total_count += 1;
        if is_correct {
            stats.correct_count += 1;
        }
        true
    }

    /// Ends the active session. `None` when nothing was active.
    pub fn end_session(&mut self) -> Option<SessionSummary> {
        if self.state != SessionState::Active {
            return None;
        }
        self.state = SessionState::Idle;

        let handle = self.handle?;
        let stats = self.stats.clone()?;
        let summary = SessionSummary {
            handle,
            accuracy: stats.accuracy(),
            stats,
            started_at: self.started_at.unwrap_or_else(Utc::now),
            ended_at: Utc::now(),
        };
        info!(
            "Ended session {}: {}/{} correct ({}%)",
            handle, summary.stats.correct_count, summary.stats.total_count, summary.accuracy
        );
        Some(summary)
    }

    /// Ends the session only if `handle` is the active one.
    pub fn end_session_for(&mut self, handle: SessionHandle) -> Option<SessionSummary> {
        if self.active_handle() != Some(handle) {
            warn!("Ignoring end request for inactive session {}", handle);
            return None;
        }
        self.end_session()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn active_handle(&self) -> Option<SessionHandle> {
        match self.state {
            SessionState::Active => self.handle,
            SessionState::Idle => None,
        }
    }

    /// Counters of the current session, or of the last ended one.
    pub fn stats(&self) -> Option<&SessionStats> {
        self.stats.as_ref()
    }

    pub fn exercise_kind(&self) -> Option<&ExerciseKind> {
        self.stats.as_ref().map(|stats| &stats.exercise_kind)
    }

    pub fn correct_count(&self) -> u64 {
        self.stats.as_ref().map_or(0, |stats| stats.correct_count)
    }

    pub fn total_count(&self) -> u64 {
        self.stats.as_ref().map_or(0, |stats| stats.total_count)
    }
}
