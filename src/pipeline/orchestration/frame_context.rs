use crate::pipeline::types::{AngleSample, ExerciseKind, KeypointFrame};
use std::time::Instant;

/// Context object that flows through the processing pipeline
/// Contains all the state needed for processing a single frame
#[derive(Debug, Clone)]
pub struct FrameContext {
    pub frame: KeypointFrame,
    pub exercise: ExerciseKind,
    pub sample: Option<AngleSample>,
    pub is_correct: Option<bool>,
    pub metrics: FrameMetrics,
    pub processing_start: Instant,
}

impl FrameContext {
    pub fn new(frame: KeypointFrame, exercise: ExerciseKind) -> Self {
        Self {
            frame,
            exercise,
            sample: None,
            is_correct: None,
            metrics: FrameMetrics::new(),
            processing_start: Instant::now(),
        }
    }

    /// Sample and verdict, once both steps have run. A missing sample counts
    /// as an unobserved joint and a missing verdict as incorrect form.
    pub fn outcome(&self) -> (AngleSample, bool) {
        let sample = self.sample.unwrap_or_else(AngleSample::invalid);
        (sample, self.is_correct.unwrap_or(false))
    }
}

/// Metrics collected during frame processing
#[derive(Debug, Clone, Default)]
pub struct FrameMetrics {
    pub angle_extraction_duration_us: u64,
    pub classification_duration_us: u64,
    pub total_processing_duration_us: u64,
}

impl FrameMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_duration(&mut self, step: ProcessingStepType, duration_us: u64) {
        match step {
            ProcessingStepType::AngleExtraction => self.angle_extraction_duration_us = duration_us,
            ProcessingStepType::Classification => self.classification_duration_us = duration_us,
        }
    }

    pub fn finalize(&mut self, start_time: Instant) {
        self.total_processing_duration_us = start_time.elapsed().as_micros() as u64;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessingStepType {
    AngleExtraction,
    Classification,
}
