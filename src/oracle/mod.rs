pub mod replay;

pub use replay::ReplayOracle;

use crate::error::OracleError;
use crate::pipeline::types::KeypointFrame;
use async_trait::async_trait;

/// The external pose-estimation model. Each call yields zero or more pose
/// results for the current cycle; an empty result means no subject was seen.
#[async_trait]
pub trait PoseOracle: Send {
    async fn estimate(&mut self) -> Result<Vec<KeypointFrame>, OracleError>;
}

#[async_trait]
impl<O> PoseOracle for Box<O>
where
    O: PoseOracle + ?Sized,
{
    async fn estimate(&mut self) -> Result<Vec<KeypointFrame>, OracleError> {
        (**self).estimate().await
    }
}
