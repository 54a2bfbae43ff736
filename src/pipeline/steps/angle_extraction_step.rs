use crate::error::AppError;
use crate::pipeline::orchestration::{FrameContext, ProcessingStep};
use crate::pipeline::services::angle_extractor::{ExtractionOptions, extract_angle};
use crate::pipeline::services::correctness::ProfileRegistry;
use async_trait::async_trait;
use std::sync::Arc;

/// Reduces the frame to the exercise's representative joint angle.
pub struct AngleExtractionStep {
    registry: Arc<ProfileRegistry>,
    options: ExtractionOptions,
}

impl AngleExtractionStep {
    pub fn new(registry: Arc<ProfileRegistry>, options: ExtractionOptions) -> Self {
        Self { registry, options }
    }
}

#[async_trait]
impl ProcessingStep for AngleExtractionStep {
    async fn process(&mut self, context: &mut FrameContext) -> Result<(), AppError> {
        let profile = self.registry.profile_for(&context.exercise);
        let sample = extract_angle(&context.frame, &profile, &self.options);
        if !sample.valid {
            tracing::debug!("Joint for {} not confidently observed", context.exercise);
        }
        context.sample = Some(sample);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "AngleExtractionStep"
    }
}
