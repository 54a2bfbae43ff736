use super::PoseOracle;
use crate::error::OracleError;
use crate::pipeline::types::KeypointFrame;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio_util::sync::CancellationToken;

/// One recorded cycle: a list of pose results or a single pose.
#[derive(Deserialize)]
#[serde(untagged)]
enum ReplayLine {
    Poses(Vec<KeypointFrame>),
    Single(KeypointFrame),
}

/// Replays pose estimates recorded one cycle per line as JSON.
///
/// Blank lines are cycles without a subject. Once the file is exhausted every
/// cycle is empty, unless looping is enabled.
pub struct ReplayOracle {
    path: PathBuf,
    lines: Option<Lines<BufReader<File>>>,
    line_number: usize,
    looping: bool,
    finished: CancellationToken,
}

impl ReplayOracle {
    pub async fn open(path: impl AsRef<Path>, looping: bool) -> Result<Self, OracleError> {
        let path = path.as_ref().to_path_buf();
        let lines = Self::open_lines(&path).await?;
        Ok(Self {
            path,
            lines: Some(lines),
            line_number: 0,
            looping,
            finished: CancellationToken::new(),
        })
    }

    async fn open_lines(path: &Path) -> Result<Lines<BufReader<File>>, OracleError> {
        let file = File::open(path).await?;
        Ok(BufReader::new(file).lines())
    }

    /// Cancelled once a non-looping replay runs out of lines.
    pub fn finished(&self) -> CancellationToken {
        self.finished.clone()
    }

    async fn next_line(&mut self) -> Result<Option<String>, OracleError> {
        let Some(lines) = self.lines.as_mut() else {
            return Ok(None);
        };
        if let Some(line) = lines.next_line().await? {
            self.line_number += 1;
            return Ok(Some(line));
        }

        if self.looping && self.line_number > 0 {
            tracing::debug!("Replay {} exhausted, rewinding", self.path.display());
            self.lines = Some(Self::open_lines(&self.path).await?);
            self.line_number = 0;
        } else {
            tracing::info!(
                "Replay {} exhausted after {} lines",
                self.path.display(),
                self.line_number
            );
            self.lines = None;
            self.finished.cancel();
        }
        Ok(None)
    }
}

#[async_trait]
impl PoseOracle for ReplayOracle {
    async fn estimate(&mut self) -> Result<Vec<KeypointFrame>, OracleError> {
        let Some(line) = self.next_line().await? else {
            return Ok(Vec::new());
        };
        if line.trim().is_empty() {
            return Ok(Vec::new());
        }
        let decoded: ReplayLine = serde_json::from_str(&line).map_err(|source| OracleError::Decode {
            line: self.line_number,
            source,
        })?;
        Ok(match decoded {
            ReplayLine::Poses(poses) => poses,
            ReplayLine::Single(pose) => vec![pose],
        })
    }
}
