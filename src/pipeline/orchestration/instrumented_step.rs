use crate::error::AppError;
use crate::pipeline::orchestration::{FrameContext, ProcessingStep, ProcessingStepType};
use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, instrument};

/// A wrapper that automatically instruments a ProcessingStep with timing and error tracking
pub struct InstrumentedStep<S> {
    inner: S,
    step_type: ProcessingStepType,
}

impl<S> InstrumentedStep<S> {
    pub fn new(step: S, step_type: ProcessingStepType) -> Self {
        Self {
            inner: step,
            step_type,
        }
    }
}

#[async_trait]
impl<S> ProcessingStep for InstrumentedStep<S>
where
    S: ProcessingStep,
{
    #[instrument(skip(self, context), fields(step = %self.inner.name()))]
    async fn process(&mut self, context: &mut FrameContext) -> Result<(), AppError> {
        let start = Instant::now();

        let result = self.inner.process(context).await;

        let duration_us = start.elapsed().as_micros() as u64;
        context.metrics.record_duration(self.step_type, duration_us);

        match &result {
            Ok(_) => debug!(
                "Completed step '{}' in {}us",
                self.inner.name(),
                duration_us
            ),
            Err(e) => tracing::error!(
                "Step '{}' failed after {}us: {}",
                self.inner.name(),
                duration_us,
                e
            ),
        }

        result
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

/// Extension trait to easily wrap steps with instrumentation
pub trait StepInstrumentation: Sized {
    fn instrumented(self, step_type: ProcessingStepType) -> InstrumentedStep<Self>;
}

impl<S> StepInstrumentation for S
where
    S: ProcessingStep,
{
    fn instrumented(self, step_type: ProcessingStepType) -> InstrumentedStep<Self> {
        InstrumentedStep::new(self, step_type)
    }
}
