use crate::error::AppError;
use crate::pipeline::orchestration::{FrameContext, ProcessingStep};
use crate::pipeline::services::correctness::ProfileRegistry;
use crate::pipeline::types::AngleSample;
use async_trait::async_trait;
use std::sync::Arc;

/// Checks the extracted angle against the exercise's correctness band.
/// Invalid samples are classified on their 0° angle like any other.
pub struct ClassificationStep {
    registry: Arc<ProfileRegistry>,
}

impl ClassificationStep {
    pub fn new(registry: Arc<ProfileRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl ProcessingStep for ClassificationStep {
    async fn process(&mut self, context: &mut FrameContext) -> Result<(), AppError> {
        let sample = context.sample.unwrap_or_else(AngleSample::invalid);
        let is_correct = self
            .registry
            .classify(&context.exercise, sample.angle_degrees);
        context.is_correct = Some(is_correct);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ClassificationStep"
    }
}
