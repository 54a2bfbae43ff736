use formcheck::{
    AppError, ConfigError, Configuration, CoordinatorBuilder, ReplayOracle, WorkoutJournal,
};
use std::str::FromStr;
use tracing::{Level, info, warn};

fn init_logging(level: &str) {
    let level = Level::from_str(level).unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let configuration = Configuration::load()?;
    init_logging(&configuration.log_level);

    let replay_path = configuration.replay_path.clone().ok_or_else(|| {
        ConfigError::Invalid("replay_path (FORMCHECK_REPLAY_PATH) is required".to_string())
    })?;
    let oracle = ReplayOracle::open(&replay_path, configuration.replay_loop).await?;
    let finished = oracle.finished();
    let journal = WorkoutJournal::default();
    let history_limit = configuration.history_limit;

    let mut coordinator = CoordinatorBuilder::new(configuration)
        .oracle(oracle)
        .journal(journal.clone())
        .build()?;

    let handle = coordinator.start_default_session().await?;
    info!("Replaying {} into session {}", replay_path.display(), handle);

    tokio::select! {
        _ = finished.cancelled() => info!("Replay finished"),
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!("Failed to listen for Ctrl-C: {}", e);
            }
            info!("Interrupted");
        }
    }

    if let Some(summary) = coordinator.end_session(handle).await? {
        info!(
            "{}: {}/{} frames correct, accuracy {}%",
            summary.stats.exercise_kind,
            summary.stats.correct_count,
            summary.stats.total_count,
            summary.accuracy
        );
    }
    let performance = coordinator.performance();
    info!(
        "Processed {} frames ({} without subject, {} oracle failures), avg {:.0}us per frame",
        performance.total_frames_processed,
        performance.cycles_without_subject,
        performance.oracle_failures,
        performance.average_frame_time_us
    );
    coordinator.shutdown().await?;

    for workout in journal.history(history_limit) {
        info!(
            "{} {} {} accuracy={}% duration={:?}s",
            workout.start_time.to_rfc3339(),
            workout.id,
            workout.exercise_type,
            workout.accuracy,
            workout.duration_secs
        );
    }
    Ok(())
}
