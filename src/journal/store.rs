use crate::error::AppError;
use crate::pipeline::services::session_tracker::{SessionHandle, SessionSummary, accuracy};
use crate::pipeline::types::ExerciseKind;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutRecord {
    pub id: SessionHandle,
    pub exercise_type: ExerciseKind,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_secs: Option<i64>,
    pub correct_count: u64,
    pub total_count: u64,
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AngleRecord {
    pub workout_id: SessionHandle,
    pub timestamp: DateTime<Utc>,
    pub angle: f64,
    pub is_correct: bool,
}

/// Persistence for workouts and their per-frame angles.
pub trait WorkoutStore: Send {
    fn start_workout(
        &mut self,
        id: SessionHandle,
        exercise: &ExerciseKind,
        start_time: DateTime<Utc>,
    );
    /// Stores the angle and advances the workout's running counts. Counts of
    /// a closed workout are left as `end_workout` wrote them.
    fn append_angle(&mut self, record: AngleRecord) -> Result<(), AppError>;
    /// Closes the workout with the tracker's final counts.
    fn end_workout(&mut self, summary: &SessionSummary) -> Result<(), AppError>;
    fn workout(&self, id: SessionHandle) -> Option<WorkoutRecord>;
    fn angles(&self, id: SessionHandle) -> Vec<AngleRecord>;
    fn history(&self, limit: usize) -> Vec<WorkoutRecord>;
}

/// In-memory store (for testing and development)
pub struct InMemoryWorkoutStore {
    workouts: IndexMap<SessionHandle, WorkoutRecord>,
    angles: VecDeque<AngleRecord>,
    max_angles: usize,
}

impl Default for InMemoryWorkoutStore {
    fn default() -> Self {
        Self::new(100_000)
    }
}

impl InMemoryWorkoutStore {
    pub fn new(max_angles: usize) -> Self {
        Self {
            workouts: IndexMap::new(),
            angles: VecDeque::with_capacity(max_angles.min(1000)),
            max_angles,
        }
    }
}

impl WorkoutStore for InMemoryWorkoutStore {
    fn start_workout(
        &mut self,
        id: SessionHandle,
        exercise: &ExerciseKind,
        start_time: DateTime<Utc>,
    ) {
        self.workouts.insert(
            id,
            WorkoutRecord {
                id,
                exercise_type: exercise.clone(),
                start_time,
                end_time: None,
                duration_secs: None,
                correct_count: 0,
                total_count: 0,
                accuracy: 0.0,
            },
        );
    }

    fn append_angle(&mut self, record: AngleRecord) -> Result<(), AppError> {
        let workout = self
            .workouts
            .get_mut(&record.workout_id)
            .ok_or_else(|| AppError::Journal(format!("Unknown workout {}", record.workout_id)))?;
        if workout.end_time.is_none() {
            workout.total_count += 1;
            if record.is_correct {
                workout.correct_count += 1;
            }
            workout.accuracy = accuracy(workout.correct_count, workout.total_count);
        }

        self.angles.push_back(record);
        if self.angles.len() > self.max_angles {
            self.angles.pop_front();
        }
        Ok(())
    }

    fn end_workout(&mut self, summary: &SessionSummary) -> Result<(), AppError> {
        let workout = self
            .workouts
            .get_mut(&summary.handle)
            .ok_or_else(|| AppError::Journal(format!("Unknown workout {}", summary.handle)))?;
        workout.end_time = Some(summary.ended_at);
        workout.duration_secs = Some((summary.ended_at - workout.start_time).num_seconds());
        workout.correct_count = summary.stats.correct_count;
        workout.total_count = summary.stats.total_count;
        workout.accuracy = summary.accuracy;
        Ok(())
    }

    fn workout(&self, id: SessionHandle) -> Option<WorkoutRecord> {
        self.workouts.get(&id).cloned()
    }

    fn angles(&self, id: SessionHandle) -> Vec<AngleRecord> {
        self.angles
            .iter()
            .filter(|record| record.workout_id == id)
            .cloned()
            .collect()
    }

    fn history(&self, limit: usize) -> Vec<WorkoutRecord> {
        // Reverse insertion order so equal start times still list newest first.
        let mut workouts: Vec<WorkoutRecord> = self.workouts.values().rev().cloned().collect();
        workouts.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        workouts.truncate(limit);
        workouts
    }
}
