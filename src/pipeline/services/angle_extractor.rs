use crate::pipeline::services::correctness::ExerciseProfile;
use crate::pipeline::types::{AngleSample, KeypointFrame};
use serde::Deserialize;

pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.3;

/// How the raw difference of the two ray angles is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleMode {
    /// Unsigned difference of the two ray headings, anywhere in [0, 360).
    #[default]
    Raw,
    /// Interior angle at the vertex, folded into [0, 180].
    Normalized,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractionOptions {
    /// Landmarks scoring at or below this are unusable for geometry.
    pub min_confidence: f64,
    pub mode: AngleMode,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            mode: AngleMode::Raw,
        }
    }
}

/// Angle at the profile's vertex landmark between the rays towards its two
/// limb endpoints.
pub fn extract_angle(
    frame: &KeypointFrame,
    profile: &ExerciseProfile,
    options: &ExtractionOptions,
) -> AngleSample {
    let (a_name, b_name, c_name) = profile.joint_triple;
    let a = frame.landmark(a_name);
    let b = frame.landmark(b_name);
    let c = frame.landmark(c_name);

    if [a, b, c]
        .iter()
        .any(|landmark| landmark.score.is_nan() || landmark.score <= options.min_confidence)
    {
        return AngleSample::invalid();
    }

    let towards_c = (c.y - b.y).atan2(c.x - b.x);
    let towards_a = (a.y - b.y).atan2(a.x - b.x);
    let raw = (towards_c - towards_a).to_degrees().abs();

    let angle = match options.mode {
        AngleMode::Raw => raw,
        AngleMode::Normalized => raw.min(360.0 - raw),
    };
    AngleSample::valid(angle)
}
