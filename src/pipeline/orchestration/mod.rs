pub mod frame_context;
pub mod instrumented_step;
pub mod metrics;
pub mod processing_step;

pub use frame_context::{FrameContext, FrameMetrics, ProcessingStepType};
pub use instrumented_step::{InstrumentedStep, StepInstrumentation};
pub use metrics::{MetricsCollector, MetricsObserver, PerformanceMonitor, PerformanceStats, SkipReason};
pub use processing_step::{ProcessingPipeline, ProcessingStep};
