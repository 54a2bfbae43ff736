pub mod angle_extraction_step;
pub mod classification_step;

pub use angle_extraction_step::AngleExtractionStep;
pub use classification_step::ClassificationStep;

use crate::pipeline::orchestration::{ProcessingPipeline, ProcessingStepType, StepInstrumentation};
use crate::pipeline::services::angle_extractor::ExtractionOptions;
use crate::pipeline::services::correctness::ProfileRegistry;
use std::sync::Arc;

/// Extraction followed by classification, each step timed.
pub fn form_pipeline(registry: Arc<ProfileRegistry>, options: ExtractionOptions) -> ProcessingPipeline {
    ProcessingPipeline::new()
        .add_step(Box::new(
            AngleExtractionStep::new(Arc::clone(&registry), options)
                .instrumented(ProcessingStepType::AngleExtraction),
        ))
        .add_step(Box::new(
            ClassificationStep::new(registry).instrumented(ProcessingStepType::Classification),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::orchestration::FrameContext;
    use crate::pipeline::types::{ExerciseKind, KeypointFrame, KeypointName, LANDMARK_COUNT, Landmark};

    fn right_angle_frame(elbow_score: f64) -> KeypointFrame {
        KeypointFrame::new([Landmark::new(0.0, 0.0, 0.9); LANDMARK_COUNT])
            .with_landmark(KeypointName::LeftShoulder, Landmark::new(0.0, 1.0, 0.9))
            .with_landmark(KeypointName::LeftElbow, Landmark::new(0.0, 0.0, elbow_score))
            .with_landmark(KeypointName::LeftWrist, Landmark::new(1.0, 0.0, 0.9))
    }

    #[tokio::test]
    async fn pipeline_extracts_then_classifies() {
        let mut pipeline = form_pipeline(
            Arc::new(ProfileRegistry::default()),
            ExtractionOptions::default(),
        );
        assert_eq!(pipeline.step_count(), 2);

        let context = pipeline
            .process(FrameContext::new(right_angle_frame(0.9), ExerciseKind::Pushups))
            .await
            .expect("pipeline");

        let (sample, is_correct) = context.outcome();
        assert!(sample.valid);
        assert!((sample.angle_degrees - 90.0).abs() < 1e-6);
        assert!(is_correct);
    }

    #[tokio::test]
    async fn low_confidence_frame_is_classified_incorrect() {
        let mut pipeline = form_pipeline(
            Arc::new(ProfileRegistry::default()),
            ExtractionOptions::default(),
        );

        let context = pipeline
            .process(FrameContext::new(right_angle_frame(0.1), ExerciseKind::Squats))
            .await
            .expect("pipeline");

        let (sample, is_correct) = context.outcome();
        assert!(!sample.valid);
        assert_eq!(sample.angle_degrees, 0.0);
        assert!(!is_correct);
    }
}
