use crate::error::FrameError;
use serde::{Deserialize, Serialize};

pub const LANDMARK_COUNT: usize = 17;

/// Landmark positions in the oracle's 17-point schema. The discriminant is the
/// index of the landmark inside a `KeypointFrame`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeypointName {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl KeypointName {
    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub score: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, score: f64) -> Self {
        Self { x, y, score }
    }
}

/// Accepted wire shapes for a pose estimate: a bare landmark array or the
/// oracle's `{"keypoints": [...]}` object.
#[derive(Deserialize)]
#[serde(untagged)]
enum FramePayload {
    Bare(Vec<Landmark>),
    Wrapped { keypoints: Vec<Landmark> },
}

/// One pose estimate. Immutable once built.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "FramePayload")]
pub struct KeypointFrame {
    landmarks: [Landmark; LANDMARK_COUNT],
}

impl KeypointFrame {
    pub fn new(landmarks: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { landmarks }
    }

    pub fn from_slice(landmarks: &[Landmark]) -> Result<Self, FrameError> {
        let landmarks: [Landmark; LANDMARK_COUNT] =
            landmarks
                .try_into()
                .map_err(|_| FrameError::LandmarkCount {
                    expected: LANDMARK_COUNT,
                    actual: landmarks.len(),
                })?;
        Ok(Self { landmarks })
    }

    pub fn landmark(&self, name: KeypointName) -> &Landmark {
        &self.landmarks[name.index()]
    }

    /// Returns a copy of this frame with one landmark replaced.
    pub fn with_landmark(mut self, name: KeypointName, landmark: Landmark) -> Self {
        self.landmarks[name.index()] = landmark;
        self
    }
}

impl TryFrom<FramePayload> for KeypointFrame {
    type Error = FrameError;

    fn try_from(payload: FramePayload) -> Result<Self, Self::Error> {
        match payload {
            FramePayload::Bare(landmarks) | FramePayload::Wrapped { keypoints: landmarks } => {
                Self::from_slice(&landmarks)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landmark_indices_follow_oracle_schema() {
        assert_eq!(KeypointName::LeftShoulder.index(), 5);
        assert_eq!(KeypointName::LeftElbow.index(), 7);
        assert_eq!(KeypointName::LeftWrist.index(), 9);
        assert_eq!(KeypointName::RightAnkle.index(), LANDMARK_COUNT - 1);
    }

    #[test]
    fn from_slice_rejects_wrong_length() {
        let result = KeypointFrame::from_slice(&[Landmark::default(); 5]);
        assert_eq!(
            result,
            Err(FrameError::LandmarkCount {
                expected: 17,
                actual: 5
            })
        );
    }

    #[test]
    fn deserializes_wrapped_payload_and_ignores_names() {
        let keypoints: Vec<serde_json::Value> = (0..LANDMARK_COUNT)
            .map(|i| serde_json::json!({"x": i as f64, "y": 1.0, "score": 0.9, "name": "kp"}))
            .collect();
        let payload = serde_json::json!({ "keypoints": keypoints });

        let frame: KeypointFrame = serde_json::from_value(payload).expect("valid frame");
        assert_eq!(frame.landmark(KeypointName::LeftElbow).x, 7.0);
        assert_eq!(frame.landmark(KeypointName::Nose).score, 0.9);
    }

    #[test]
    fn deserializing_short_array_fails() {
        let payload = serde_json::json!([{"x": 0.0, "y": 0.0, "score": 1.0}]);
        assert!(serde_json::from_value::<KeypointFrame>(payload).is_err());
    }
}
