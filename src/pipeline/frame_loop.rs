use crate::error::AppError;
use crate::oracle::PoseOracle;
use crate::pipeline::orchestration::{FrameContext, MetricsCollector, ProcessingPipeline, SkipReason};
use crate::pipeline::services::frame_publish::UpdatePublishingService;
use crate::pipeline::services::session_tracker::{
    SessionHandle, SessionState, SessionStats, SessionSummary, SessionTracker,
};
use crate::pipeline::types::{ExerciseKind, FrameUpdate, KeypointFrame};
use chrono::Utc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tower::{Service, ServiceExt};
use tracing::{debug, info, warn};

/// Session control requests, handled by the loop between cycles.
pub enum SessionCommand {
    Start {
        exercise: ExerciseKind,
        responder: oneshot::Sender<SessionHandle>,
    },
    /// Ends the given session, or whatever is active when `handle` is `None`.
    End {
        handle: Option<SessionHandle>,
        responder: oneshot::Sender<Option<SessionSummary>>,
    },
    Snapshot {
        responder: oneshot::Sender<SessionSnapshot>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub handle: Option<SessionHandle>,
    pub stats: Option<SessionStats>,
}

/// Notified synchronously inside the loop whenever a session starts or ends,
/// before any update of the new session is published.
pub trait SessionObserver: Send {
    fn on_session_started(&mut self, handle: SessionHandle, exercise: &ExerciseKind);
    fn on_session_ended(&mut self, summary: &SessionSummary);
}

/// What a single cycle did.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    NoSubject,
    OracleFailure,
    StepFailure,
    Updated(FrameUpdate),
}

/// Single-task driver: one pose estimate per tick, run through the form
/// pipeline, recorded on the owned tracker, published to observers.
pub struct FrameLoop<O> {
    oracle: O,
    pipeline: ProcessingPipeline,
    tracker: SessionTracker,
    publisher: UpdatePublishingService,
    metrics: MetricsCollector,
    session_observers: Vec<Box<dyn SessionObserver>>,
    default_exercise: ExerciseKind,
    exclude_low_confidence_frames: bool,
}

impl<O> FrameLoop<O>
where
    O: PoseOracle,
{
    pub fn new(oracle: O, pipeline: ProcessingPipeline, publisher: UpdatePublishingService) -> Self {
        Self {
            oracle,
            pipeline,
            tracker: SessionTracker::new(),
            publisher,
            metrics: MetricsCollector::new(),
            session_observers: Vec::new(),
            default_exercise: ExerciseKind::Pushups,
            exclude_low_confidence_frames: false,
        }
    }

    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_session_observer(mut self, observer: Box<dyn SessionObserver>) -> Self {
        self.session_observers.push(observer);
        self
    }

    /// Exercise used to evaluate frames before the first session starts.
    pub fn with_default_exercise(mut self, exercise: ExerciseKind) -> Self {
        self.default_exercise = exercise;
        self
    }

    pub fn exclude_low_confidence_frames(mut self, exclude: bool) -> Self {
        self.exclude_low_confidence_frames = exclude;
        self
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    pub fn start_session(&mut self, exercise: ExerciseKind) -> SessionHandle {
        let handle = self.tracker.start_session(exercise.clone());
        for observer in &mut self.session_observers {
            observer.on_session_started(handle, &exercise);
        }
        handle
    }

    pub fn end_session(&mut self, handle: Option<SessionHandle>) -> Option<SessionSummary> {
        let summary = match handle {
            Some(handle) => self.tracker.end_session_for(handle),
            None => self.tracker.end_session(),
        }?;
        for observer in &mut self.session_observers {
            observer.on_session_ended(&summary);
        }
        Some(summary)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.tracker.state(),
            handle: self.tracker.active_handle(),
            stats: self.tracker.stats().cloned(),
        }
    }

    pub fn handle_command(&mut self, command: SessionCommand) {
        // A dropped responder only means the caller stopped waiting.
        match command {
            SessionCommand::Start {
                exercise,
                responder,
            } => {
                let handle = self.start_session(exercise);
                let _ = responder.send(handle);
            }
            SessionCommand::End { handle, responder } => {
                let summary = self.end_session(handle);
                let _ = responder.send(summary);
            }
            SessionCommand::Snapshot { responder } => {
                let _ = responder.send(self.snapshot());
            }
        }
    }

    fn current_exercise(&self) -> ExerciseKind {
        self.tracker
            .exercise_kind()
            .cloned()
            .unwrap_or_else(|| self.default_exercise.clone())
    }

    /// Fetches one estimate and processes it. Never fails; a failing cycle
    /// is logged and reported as skipped.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let poses = match self.oracle.estimate().await {
            Ok(poses) => poses,
            Err(e) => {
                warn!("Pose estimation failed, skipping cycle: {}", e);
                self.metrics.notify_cycle_skipped(SkipReason::OracleFailure);
                return CycleOutcome::OracleFailure;
            }
        };

        // Single subject: anything past the first result is ignored.
        let Some(frame) = poses.into_iter().next() else {
            self.metrics.notify_cycle_skipped(SkipReason::NoSubject);
            return CycleOutcome::NoSubject;
        };

        match self.process_frame(frame).await {
            Ok(update) => CycleOutcome::Updated(update),
            Err(e) => {
                warn!("Frame processing failed, skipping cycle: {}", e);
                self.metrics.notify_cycle_skipped(SkipReason::StepFailure);
                CycleOutcome::StepFailure
            }
        }
    }

    async fn process_frame(&mut self, frame: KeypointFrame) -> Result<FrameUpdate, AppError> {
        let context = FrameContext::new(frame, self.current_exercise());
        let context = self.pipeline.process(context).await?;
        self.metrics.notify_frame_processed(&context.metrics);

        let (sample, is_correct) = context.outcome();
        let recorded = if !sample.valid && self.exclude_low_confidence_frames {
            false
        } else {
            self.tracker.record_frame(is_correct)
        };

        let update = FrameUpdate {
            session: self.tracker.active_handle(),
            angle_degrees: sample.angle_degrees,
            valid: sample.valid,
            is_correct,
            recorded,
            correct_count: self.tracker.correct_count(),
            total_count: self.tracker.total_count(),
            timestamp: Utc::now(),
        };

        let delivered = self
            .publisher
            .ready()
            .await?
            .call(update.clone())
            .await?;
        debug!(
            "Frame {:.1}° correct={} ({}/{}) delivered to {} observers",
            update.angle_degrees, is_correct, update.correct_count, update.total_count, delivered
        );
        Ok(update)
    }

    /// Runs until `cancel` fires, one cycle per tick. Session commands are
    /// served between cycles. Returns the tracker for final reporting.
    pub async fn run(
        mut self,
        tick_period: Duration,
        mut commands: mpsc::Receiver<SessionCommand>,
        cancel: CancellationToken,
    ) -> SessionTracker {
        let mut ticker = tokio::time::interval(tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Frame loop started, tick period {:?}", tick_period);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                Some(command) = commands.recv() => self.handle_command(command),
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
            }
        }

        info!("Frame loop stopped");
        self.tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OracleError;
    use crate::pipeline::orchestration::PerformanceMonitor;
    use crate::pipeline::services::angle_extractor::ExtractionOptions;
    use crate::pipeline::services::correctness::ProfileRegistry;
    use crate::pipeline::steps::form_pipeline;
    use crate::pipeline::types::{KeypointName, LANDMARK_COUNT, Landmark};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    type Script = Arc<Mutex<VecDeque<Result<Vec<KeypointFrame>, OracleError>>>>;

    /// Plays back queued results, then reports no subject.
    #[derive(Clone, Default)]
    struct ScriptedOracle {
        script: Script,
    }

    impl ScriptedOracle {
        fn push(&self, result: Result<Vec<KeypointFrame>, OracleError>) {
            self.script.lock().expect("script").push_back(result);
        }
    }

    #[async_trait]
    impl PoseOracle for ScriptedOracle {
        async fn estimate(&mut self) -> Result<Vec<KeypointFrame>, OracleError> {
            self.script
                .lock()
                .expect("script")
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    /// Elbow at the origin, shoulder straight up, wrist rotated by `angle`.
    fn arm_at(angle: f64, score: f64) -> KeypointFrame {
        let radians = angle.to_radians();
        KeypointFrame::new([Landmark::new(0.0, 0.0, 0.9); LANDMARK_COUNT])
            .with_landmark(KeypointName::LeftShoulder, Landmark::new(1.0, 0.0, 0.9))
            .with_landmark(KeypointName::LeftElbow, Landmark::new(0.0, 0.0, score))
            .with_landmark(
                KeypointName::LeftWrist,
                Landmark::new(radians.cos(), radians.sin(), 0.9),
            )
    }

    fn frame_loop(oracle: ScriptedOracle) -> FrameLoop<ScriptedOracle> {
        let (publisher, _) = UpdatePublishingService::new(16);
        FrameLoop::new(
            oracle,
            form_pipeline(Arc::new(ProfileRegistry::default()), ExtractionOptions::default()),
            publisher,
        )
    }

    fn expect_update(outcome: CycleOutcome) -> FrameUpdate {
        match outcome {
            CycleOutcome::Updated(update) => update,
            other => panic!("expected an update, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn squat_session_counts_correct_and_incorrect_frames() {
        let oracle = ScriptedOracle::default();
        let mut frame_loop = frame_loop(oracle.clone());
        let handle = frame_loop.start_session(ExerciseKind::Squats);

        for _ in 0..10 {
            oracle.push(Ok(vec![arm_at(90.0, 0.9)]));
            let update = expect_update(frame_loop.run_cycle().await);
            assert!(update.is_correct);
            assert_eq!(update.session, Some(handle));
        }
        assert_eq!(frame_loop.tracker().correct_count(), 10);
        assert_eq!(frame_loop.tracker().total_count(), 10);

        for _ in 0..5 {
            oracle.push(Ok(vec![arm_at(30.0, 0.9)]));
            assert!(!expect_update(frame_loop.run_cycle().await).is_correct);
        }
        let summary = frame_loop.end_session(Some(handle)).expect("summary");
        assert_eq!(summary.stats.correct_count, 10);
        assert_eq!(summary.stats.total_count, 15);

        oracle.push(Ok(vec![arm_at(90.0, 0.9)]));
        let after = expect_update(frame_loop.run_cycle().await);
        assert!(!after.recorded);
        assert_eq!(after.session, None);
        assert_eq!((after.correct_count, after.total_count), (10, 15));
    }

    #[tokio::test]
    async fn frames_before_session_are_evaluated_but_not_recorded() {
        let oracle = ScriptedOracle::default();
        let mut frame_loop = frame_loop(oracle.clone());

        oracle.push(Ok(vec![arm_at(90.0, 0.9)]));
        let update = expect_update(frame_loop.run_cycle().await);
        assert!(update.is_correct);
        assert!(!update.recorded);
        assert_eq!((update.correct_count, update.total_count), (0, 0));
        assert!(frame_loop.tracker().stats().is_none());
    }

    #[tokio::test]
    async fn oracle_failure_and_empty_results_skip_the_cycle() {
        let oracle = ScriptedOracle::default();
        let monitor = PerformanceMonitor::new();
        let mut frame_loop = frame_loop(oracle.clone())
            .with_metrics(MetricsCollector::new().add_observer(Box::new(monitor.clone())));
        frame_loop.start_session(ExerciseKind::Pushups);

        oracle.push(Err(OracleError::Unavailable("camera busy".to_string())));
        oracle.push(Ok(Vec::new()));
        oracle.push(Ok(vec![arm_at(90.0, 0.9)]));

        assert_eq!(frame_loop.run_cycle().await, CycleOutcome::OracleFailure);
        assert_eq!(frame_loop.run_cycle().await, CycleOutcome::NoSubject);
        assert_eq!(frame_loop.tracker().total_count(), 0);

        let update = expect_update(frame_loop.run_cycle().await);
        assert_eq!((update.correct_count, update.total_count), (1, 1));

        let stats = monitor.get_stats();
        assert_eq!(stats.oracle_failures, 1);
        assert_eq!(stats.cycles_without_subject, 1);
        assert_eq!(stats.total_frames_processed, 1);
    }

    #[tokio::test]
    async fn only_the_first_pose_is_used() {
        let oracle = ScriptedOracle::default();
        let mut frame_loop = frame_loop(oracle.clone());
        frame_loop.start_session(ExerciseKind::Pullups);

        oracle.push(Ok(vec![arm_at(135.0, 0.9), arm_at(90.0, 0.9)]));
        let update = expect_update(frame_loop.run_cycle().await);
        assert!((update.angle_degrees - 135.0).abs() < 1e-6);
        assert!(update.is_correct);
        assert_eq!(update.total_count, 1);
    }

    #[tokio::test]
    async fn low_confidence_frames_count_as_incorrect_by_default() {
        let oracle = ScriptedOracle::default();
        let mut frame_loop = frame_loop(oracle.clone());
        frame_loop.start_session(ExerciseKind::Squats);

        oracle.push(Ok(vec![arm_at(90.0, 0.2)]));
        let update = expect_update(frame_loop.run_cycle().await);
        assert!(!update.valid);
        assert_eq!(update.angle_degrees, 0.0);
        assert!(update.recorded);
        assert_eq!((update.correct_count, update.total_count), (0, 1));
    }

    #[tokio::test]
    async fn low_confidence_frames_can_be_excluded() {
        let oracle = ScriptedOracle::default();
        let mut frame_loop = frame_loop(oracle.clone()).exclude_low_confidence_frames(true);
        frame_loop.start_session(ExerciseKind::Squats);

        oracle.push(Ok(vec![arm_at(90.0, 0.2)]));
        oracle.push(Ok(vec![arm_at(90.0, 0.9)]));

        let skipped = expect_update(frame_loop.run_cycle().await);
        assert!(!skipped.recorded);
        assert_eq!(skipped.total_count, 0);

        let counted = expect_update(frame_loop.run_cycle().await);
        assert!(counted.recorded);
        assert_eq!((counted.correct_count, counted.total_count), (1, 1));
    }

    #[tokio::test]
    async fn restarting_resets_counts() {
        let oracle = ScriptedOracle::default();
        let mut frame_loop = frame_loop(oracle.clone());
        frame_loop.start_session(ExerciseKind::Pushups);
        oracle.push(Ok(vec![arm_at(90.0, 0.9)]));
        frame_loop.run_cycle().await;

        frame_loop.start_session(ExerciseKind::Pushups);
        let snapshot = frame_loop.snapshot();
        assert_eq!(snapshot.state, SessionState::Active);
        let stats = snapshot.stats.expect("stats");
        assert_eq!((stats.correct_count, stats.total_count), (0, 0));
    }

    #[derive(Clone, Default)]
    struct RecordingObserver {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl SessionObserver for RecordingObserver {
        fn on_session_started(&mut self, _handle: SessionHandle, exercise: &ExerciseKind) {
            self.events.lock().expect("events").push(format!("start {}", exercise));
        }

        fn on_session_ended(&mut self, summary: &SessionSummary) {
            self.events
                .lock()
                .expect("events")
                .push(format!("end {}", summary.stats.total_count));
        }
    }

    #[tokio::test]
    async fn commands_are_answered_and_observers_notified() {
        let observer = RecordingObserver::default();
        let mut frame_loop =
            frame_loop(ScriptedOracle::default()).with_session_observer(Box::new(observer.clone()));

        let (responder, started) = oneshot::channel();
        frame_loop.handle_command(SessionCommand::Start {
            exercise: ExerciseKind::Squats,
            responder,
        });
        let handle = started.await.expect("handle");

        let (responder, ended) = oneshot::channel();
        frame_loop.handle_command(SessionCommand::End {
            handle: Some(handle),
            responder,
        });
        assert!(ended.await.expect("summary").is_some());

        let (responder, ended_again) = oneshot::channel();
        frame_loop.handle_command(SessionCommand::End {
            handle: None,
            responder,
        });
        assert!(ended_again.await.expect("summary").is_none());

        let events = observer.events.lock().expect("events").clone();
        assert_eq!(events, vec!["start squats".to_string(), "end 0".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn run_serves_commands_between_ticks_until_cancelled() {
        let oracle = ScriptedOracle::default();
        for _ in 0..100 {
            oracle.push(Ok(vec![arm_at(90.0, 0.9)]));
        }
        let frame_loop = frame_loop(oracle);
        let (command_tx, command_rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(frame_loop.run(
            Duration::from_millis(10),
            command_rx,
            cancel.clone(),
        ));

        let (responder, started) = oneshot::channel();
        command_tx
            .send(SessionCommand::Start {
                exercise: ExerciseKind::Pushups,
                responder,
            })
            .await
            .expect("send");
        started.await.expect("handle");

        tokio::time::sleep(Duration::from_millis(55)).await;
        cancel.cancel();
        let tracker = task.await.expect("loop task");

        assert!(tracker.is_active());
        assert!(tracker.total_count() >= 1);
        assert_eq!(tracker.correct_count(), tracker.total_count());
    }
}
