use crate::{
    config::Configuration,
    error::{AppError, OracleError, SessionError},
    journal::WorkoutJournal,
    oracle::PoseOracle,
    pipeline::{
        frame_loop::{FrameLoop, SessionCommand, SessionSnapshot},
        orchestration::{MetricsCollector, MetricsObserver, PerformanceMonitor, PerformanceStats},
        services::{
            angle_extractor::AngleMode,
            frame_publish::UpdatePublishingService,
            session_tracker::{SessionHandle, SessionSummary, SessionTracker},
        },
        steps::form_pipeline,
        types::{ExerciseKind, FrameUpdate},
    },
};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Owns the frame loop task and the handles used to talk to it.
pub struct Coordinator {
    loop_task: Option<JoinHandle<SessionTracker>>,
    journal_task: Option<JoinHandle<()>>,
    commands: mpsc::Sender<SessionCommand>,
    publisher: UpdatePublishingService,
    monitor: PerformanceMonitor,
    default_exercise: ExerciseKind,
    cancel_token: CancellationToken,
    journal_cancel: CancellationToken,
}

impl Coordinator {
    fn new(
        configuration: Configuration,
        oracle: Box<dyn PoseOracle>,
        journal: Option<WorkoutJournal>,
        observers: Vec<Box<dyn MetricsObserver>>,
    ) -> Self {
        let cancel_token = CancellationToken::new();
        let (publisher, _) = UpdatePublishingService::new(configuration.update_buffer_size);
        let (commands, command_rx) = mpsc::channel(configuration.command_buffer_size);
        let monitor = PerformanceMonitor::new();

        let mut metrics = MetricsCollector::new().add_observer(Box::new(monitor.clone()));
        for observer in observers {
            metrics = metrics.add_observer(observer);
        }

        let pipeline = form_pipeline(
            Arc::new(configuration.profile_registry()),
            configuration.extraction_options(),
        );
        let mut frame_loop = FrameLoop::new(oracle, pipeline, publisher.clone())
            .with_metrics(metrics)
            .with_default_exercise(configuration.exercise_kind())
            .exclude_low_confidence_frames(configuration.exclude_low_confidence_frames);

        // Subscribed before the loop starts so no update of a session is missed.
        let journal_cancel = CancellationToken::new();
        let journal_task = match &journal {
            Some(journal) => {
                frame_loop = frame_loop.with_session_observer(Box::new(journal.clone()));
                Some(journal.spawn(publisher.subscribe(), journal_cancel.clone()))
            }
            None => None,
        };

        let loop_task = tokio::spawn(frame_loop.run(
            configuration.tick_period(),
            command_rx,
            cancel_token.clone(),
        ));

        Self {
            loop_task: Some(loop_task),
            journal_task,
            commands,
            publisher,
            monitor,
            default_exercise: configuration.exercise_kind(),
            cancel_token,
            journal_cancel,
        }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, AppError> {
        let (responder, response) = oneshot::channel();
        self.commands
            .send(command(responder))
            .await
            .map_err(|_| SessionError::LoopStopped)?;
        Ok(response.await.map_err(|_| SessionError::LoopStopped)?)
    }

    /// Starts (or restarts) a session. Any exercise name is accepted.
    pub async fn start_session(
        &self,
        exercise: impl Into<ExerciseKind>,
    ) -> Result<SessionHandle, AppError> {
        let exercise = exercise.into();
        self.request(|responder| SessionCommand::Start {
            exercise,
            responder,
        })
        .await
    }

    /// Starts a session for the configured default exercise.
    pub async fn start_default_session(&self) -> Result<SessionHandle, AppError> {
        self.start_session(self.default_exercise.clone()).await
    }

    /// `None` when `handle` is not the active session.
    pub async fn end_session(
        &self,
        handle: SessionHandle,
    ) -> Result<Option<SessionSummary>, AppError> {
        self.request(|responder| SessionCommand::End {
            handle: Some(handle),
            responder,
        })
        .await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, AppError> {
        self.request(|responder| SessionCommand::Snapshot { responder })
            .await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FrameUpdate> {
        self.publisher.subscribe()
    }

    pub fn performance(&self) -> PerformanceStats {
        self.monitor.get_stats()
    }

    pub fn stop(&self) {
        self.cancel_token.cancel();
        self.journal_cancel.cancel();
    }

    /// Stops the loop and waits for it, returning the final tracker state.
    /// The journal is stopped only after the loop's last update is out.
    pub async fn shutdown(&mut self) -> Result<SessionTracker, AppError> {
        self.cancel_token.cancel();
        let loop_task = self.loop_task.take().ok_or(SessionError::LoopStopped)?;
        let tracker = loop_task.await?;

        self.journal_cancel.cancel();
        if let Some(journal_task) = self.journal_task.take() {
            journal_task.await?;
        }
        Ok(tracker)
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.stop();
    }
}

pub struct CoordinatorBuilder {
    configuration: Configuration,
    oracle: Option<Box<dyn PoseOracle>>,
    journal: Option<WorkoutJournal>,
    observers: Vec<Box<dyn MetricsObserver>>,
}

impl CoordinatorBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            oracle: None,
            journal: None,
            observers: Vec::new(),
        }
    }

    // Sets the default exercise, this will override the default configuration.
    pub fn exercise(mut self, exercise: impl Into<String>) -> Self {
        self.configuration.exercise = exercise.into();
        self
    }

    // Adjusts the refresh rate, this will override the default configuration.
    pub fn refresh_hz(mut self, refresh_hz: u32) -> Self {
        self.configuration.refresh_hz = refresh_hz;
        self
    }

    pub fn min_confidence(mut self, min_confidence: f64) -> Self {
        self.configuration.min_confidence = min_confidence;
        self
    }

    pub fn angle_mode(mut self, angle_mode: AngleMode) -> Self {
        self.configuration.angle_mode = angle_mode;
        self
    }

    pub fn exclude_low_confidence_frames(mut self, exclude: bool) -> Self {
        self.configuration.exclude_low_confidence_frames = exclude;
        self
    }

    // Adjusts the update buffer size, this will override the default configuration.
    pub fn update_buffer_size(mut self, update_buffer_size: usize) -> Self {
        self.configuration.update_buffer_size = update_buffer_size;
        self
    }

    pub fn oracle(mut self, oracle: impl PoseOracle + 'static) -> Self {
        self.oracle = Some(Box::new(oracle));
        self
    }

    pub fn journal(mut self, journal: WorkoutJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn metrics_observer(mut self, observer: Box<dyn MetricsObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Spawns the loop; must be called inside a tokio runtime.
    pub fn build(self) -> Result<Coordinator, AppError> {
        self.configuration.validate()?;
        let oracle = self
            .oracle
            .ok_or_else(|| OracleError::Unavailable("No pose oracle configured".to_string()))?;
        Ok(Coordinator::new(
            self.configuration,
            oracle,
            self.journal,
            self.observers,
        ))
    }
}
