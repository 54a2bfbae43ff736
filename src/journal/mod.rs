pub mod store;

pub use store::{AngleRecord, InMemoryWorkoutStore, WorkoutRecord, WorkoutStore};

use crate::error::AppError;
use crate::pipeline::frame_loop::SessionObserver;
use crate::pipeline::services::session_tracker::{SessionHandle, SessionSummary};
use crate::pipeline::types::{ExerciseKind, FrameUpdate};
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Shared handle to the workout store. Session lifecycle arrives from the
/// frame loop as a `SessionObserver`; angle records arrive from the update
/// broadcast via `spawn`.
#[derive(Clone)]
pub struct WorkoutJournal {
    store: Arc<Mutex<Box<dyn WorkoutStore>>>,
}

impl Default for WorkoutJournal {
    fn default() -> Self {
        Self::new(InMemoryWorkoutStore::default())
    }
}

impl WorkoutJournal {
    pub fn new(store: impl WorkoutStore + 'static) -> Self {
        Self {
            store: Arc::new(Mutex::new(Box::new(store))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn WorkoutStore>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends the update's angle to its workout. Updates that did not
    /// advance a session are not persisted.
    pub fn append_update(&self, update: &FrameUpdate) -> Result<bool, AppError> {
        let Some(workout_id) = update.session.filter(|_| update.recorded) else {
            return Ok(false);
        };
        self.lock().append_angle(AngleRecord {
            workout_id,
            timestamp: update.timestamp,
            angle: update.angle_degrees,
            is_correct: update.is_correct,
        })?;
        Ok(true)
    }

    /// Most recent workouts first.
    pub fn history(&self, limit: usize) -> Vec<WorkoutRecord> {
        self.lock().history(limit)
    }

    pub fn workout(&self, id: SessionHandle) -> Option<WorkoutRecord> {
        self.lock().workout(id)
    }

    pub fn angles(&self, id: SessionHandle) -> Vec<AngleRecord> {
        self.lock().angles(id)
    }

    /// Drains `updates` into the store until the channel closes, or until
    /// `cancel` fires and nothing is left buffered.
    pub fn spawn(
        &self,
        mut updates: broadcast::Receiver<FrameUpdate>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let journal = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    received = updates.recv() => match received {
                        Ok(update) => {
                            if let Err(e) = journal.append_update(&update) {
                                warn!("Failed to journal frame update: {}", e);
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("Journal lagged behind, {} updates lost", skipped);
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = cancel.cancelled() => break,
                }
            }
            debug!("Journal task stopped");
        })
    }
}

impl SessionObserver for WorkoutJournal {
    fn on_session_started(&mut self, handle: SessionHandle, exercise: &ExerciseKind) {
        self.lock().start_workout(handle, exercise, Utc::now());
    }

    fn on_session_ended(&mut self, summary: &SessionSummary) {
        if let Err(e) = self.lock().end_workout(summary) {
            warn!("Failed to close workout {}: {}", summary.handle, e);
        }
    }
}
