use super::frame_context::{FrameMetrics, ProcessingStepType};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Why a loop cycle produced no update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoSubject,
    OracleFailure,
    StepFailure,
}

/// Observer pattern for metrics collection
pub trait MetricsObserver: Send + Sync {
    fn on_frame_processed(&mut self, metrics: &FrameMetrics);
    fn on_cycle_skipped(&mut self, reason: SkipReason);
}

/// Collects and manages multiple metrics observers
#[derive(Default)]
pub struct MetricsCollector {
    observers: Vec<Box<dyn MetricsObserver>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    pub fn add_observer(mut self, observer: Box<dyn MetricsObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn notify_frame_processed(&mut self, metrics: &FrameMetrics) {
        for observer in &mut self.observers {
            observer.on_frame_processed(metrics);
        }
    }

    pub fn notify_cycle_skipped(&mut self, reason: SkipReason) {
        for observer in &mut self.observers {
            observer.on_cycle_skipped(reason);
        }
    }
}

/// Performance monitoring observer
#[derive(Clone, Default)]
pub struct PerformanceMonitor {
    stats: Arc<Mutex<PerformanceStats>>,
}

#[derive(Debug, Clone)]
pub struct PerformanceStats {
    pub total_frames_processed: usize,
    pub cycles_without_subject: usize,
    pub oracle_failures: usize,
    pub step_failures: usize,
    pub average_frame_time_us: f32,
    pub frames_per_second: f32,
    pub last_fps_calculation: Instant,
    pub fps_frame_count: usize,

    // EWMA timing stats per step
    pub avg_angle_extraction_us: f32,
    pub avg_classification_us: f32,

    pub max_frame_time_us: u64,
}

impl Default for PerformanceStats {
    fn default() -> Self {
        Self {
            total_frames_processed: 0,
            cycles_without_subject: 0,
            oracle_failures: 0,
            step_failures: 0,
            average_frame_time_us: 0.0,
            frames_per_second: 0.0,
            last_fps_calculation: Instant::now(),
            fps_frame_count: 0,
            avg_angle_extraction_us: 0.0,
            avg_classification_us: 0.0,
            max_frame_time_us: 0,
        }
    }
}

const ALPHA: f32 = 0.1; // EWMA smoothing factor

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_stats(&self) -> PerformanceStats {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, PerformanceStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update_ewma(current: f32, new_value: u64, alpha: f32) -> f32 {
        current * (1.0 - alpha) + new_value as f32 * alpha
    }

    fn step_duration(metrics: &FrameMetrics, step: ProcessingStepType) -> u64 {
        match step {
            ProcessingStepType::AngleExtraction => metrics.angle_extraction_duration_us,
            ProcessingStepType::Classification => metrics.classification_duration_us,
        }
    }
}

impl MetricsObserver for PerformanceMonitor {
    fn on_frame_processed(&mut self, metrics: &FrameMetrics) {
        let mut stats = self.lock();
        stats.total_frames_processed += 1;
        tracing::debug!(
            "PerformanceMonitor: processed frame {}, total_time={}us",
            stats.total_frames_processed,
            metrics.total_processing_duration_us
        );

        stats.average_frame_time_us = Self::update_ewma(
            stats.average_frame_time_us,
            metrics.total_processing_duration_us,
            ALPHA,
        );
        stats.max_frame_time_us = stats
            .max_frame_time_us
            .max(metrics.total_processing_duration_us);
        stats.avg_angle_extraction_us = Self::update_ewma(
            stats.avg_angle_extraction_us,
            Self::step_duration(metrics, ProcessingStepType::AngleExtraction),
            ALPHA,
        );
        stats.avg_classification_us = Self::update_ewma(
            stats.avg_classification_us,
            Self::step_duration(metrics, ProcessingStepType::Classification),
            ALPHA,
        );

        // Update FPS calculation
        stats.fps_frame_count += 1;
        let now = Instant::now();
        let elapsed = now.duration_since(stats.last_fps_calculation);
        if elapsed.as_secs_f32() >= 1.0 {
            stats.frames_per_second = stats.fps_frame_count as f32 / elapsed.as_secs_f32();
            stats.fps_frame_count = 0;
            stats.last_fps_calculation = now;
        }
    }

    fn on_cycle_skipped(&mut self, reason: SkipReason) {
        let mut stats = self.lock();
        match reason {
            SkipReason::NoSubject => stats.cycles_without_subject += 1,
            SkipReason::OracleFailure => stats.oracle_failures += 1,
            SkipReason::StepFailure => stats.step_failures += 1,
        }
    }
}
