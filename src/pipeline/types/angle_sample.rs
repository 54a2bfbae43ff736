use serde::Serialize;

/// Joint angle derived from one frame. Lives only for the frame's cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AngleSample {
    pub angle_degrees: f64,
    pub valid: bool,
}

impl AngleSample {
    pub fn valid(angle_degrees: f64) -> Self {
        Self {
            angle_degrees,
            valid: true,
        }
    }

    /// A required landmark was not confidently observed.
    pub fn invalid() -> Self {
        Self {
            angle_degrees: 0.0,
            valid: false,
        }
    }
}
