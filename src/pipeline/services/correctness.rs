use crate::pipeline::types::{ExerciseKind, KeypointName};
use indexmap::IndexMap;
use serde::Deserialize;

pub type JointTriple = (KeypointName, KeypointName, KeypointName);

/// Shoulder, elbow, wrist on the left side; the elbow is the vertex.
pub const LEFT_ELBOW_TRIPLE: JointTriple = (
    KeypointName::LeftShoulder,
    KeypointName::LeftElbow,
    KeypointName::LeftWrist,
);

/// Open angle interval, both bounds exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleBand {
    pub low: f64,
    pub high: f64,
}

impl AngleBand {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, angle: f64) -> bool {
        angle > self.low && angle < self.high
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExerciseProfile {
    pub joint_triple: JointTriple,
    /// `None` means no angle is ever form-correct.
    pub correct_range: Option<AngleBand>,
}

impl ExerciseProfile {
    pub const fn new(joint_triple: JointTriple, correct_range: AngleBand) -> Self {
        Self {
            joint_triple,
            correct_range: Some(correct_range),
        }
    }

    pub const fn unbanded() -> Self {
        Self {
            joint_triple: LEFT_ELBOW_TRIPLE,
            correct_range: None,
        }
    }

    pub fn is_correct(&self, angle: f64) -> bool {
        self.correct_range
            .map(|band| band.contains(angle))
            .unwrap_or(false)
    }
}

/// Per-exercise override read from configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProfileSettings {
    #[serde(default)]
    pub joint: Option<[KeypointName; 3]>,
    pub low: f64,
    pub high: f64,
}

impl ProfileSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.low >= self.high {
            return Err(format!(
                "Angle band low bound {} must be below high bound {}",
                self.low, self.high
            ));
        }
        Ok(())
    }
}

/// Exercise profiles keyed by kind, in registration order.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: IndexMap<ExerciseKind, ExerciseProfile>,
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::new()
            .with_profile(
                ExerciseKind::Pushups,
                ExerciseProfile::new(LEFT_ELBOW_TRIPLE, AngleBand::new(80.0, 100.0)),
            )
            .with_profile(
                ExerciseKind::Squats,
                ExerciseProfile::new(LEFT_ELBOW_TRIPLE, AngleBand::new(70.0, 110.0)),
            )
            .with_profile(
                ExerciseKind::Pullups,
                ExerciseProfile::new(LEFT_ELBOW_TRIPLE, AngleBand::new(120.0, 150.0)),
            )
    }
}

impl ProfileRegistry {
    /// An empty registry; every exercise falls back to the unbanded profile.
    pub fn new() -> Self {
        Self {
            profiles: IndexMap::new(),
        }
    }

    pub fn with_profile(mut self, kind: ExerciseKind, profile: ExerciseProfile) -> Self {
        self.profiles.insert(kind, profile);
        self
    }

    /// Applies configured overrides on top of the current profiles. An
    /// override without a joint keeps the joint already registered.
    pub fn with_settings<'a>(
        mut self,
        settings: impl IntoIterator<Item = (&'a String, &'a ProfileSettings)>,
    ) -> Self {
        for (name, setting) in settings {
            let kind = ExerciseKind::parse(name);
            let joint_triple = setting
                .joint
                .map(|[a, b, c]| (a, b, c))
                .or_else(|| self.profiles.get(&kind).map(|p| p.joint_triple))
                .unwrap_or(LEFT_ELBOW_TRIPLE);
            self.profiles.insert(
                kind,
                ExerciseProfile::new(joint_triple, AngleBand::new(setting.low, setting.high)),
            );
        }
        self
    }

    pub fn profile_for(&self, kind: &ExerciseKind) -> ExerciseProfile {
        self.profiles
            .get(kind)
            .copied()
            .unwrap_or_else(ExerciseProfile::unbanded)
    }

    pub fn classify(&self, kind: &ExerciseKind, angle_degrees: f64) -> bool {
        self.profile_for(kind).is_correct(angle_degrees)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &ExerciseKind> {
        self.profiles.keys()
    }
}

/// Form verdict against the built-in bands. Unknown exercises fail closed.
pub fn classify(kind: &ExerciseKind, angle_degrees: f64) -> bool {
    match kind {
        ExerciseKind::Pushups => AngleBand::new(80.0, 100.0).contains(angle_degrees),
        ExerciseKind::Squats => AngleBand::new(70.0, 110.0).contains(angle_degrees),
        ExerciseKind::Pullups => AngleBand::new(120.0, 150.0).contains(angle_degrees),
        ExerciseKind::Other(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pushup_band_is_exclusive() {
        assert!(classify(&ExerciseKind::Pushups, 90.0));
        assert!(!classify(&ExerciseKind::Pushups, 100.0));
        assert!(!classify(&ExerciseKind::Pushups, 80.0));
    }

    #[test]
    fn squat_and_pullup_bands() {
        assert!(classify(&ExerciseKind::Squats, 90.0));
        assert!(!classify(&ExerciseKind::Squats, 110.0));
        assert!(classify(&ExerciseKind::Pullups, 135.0));
        assert!(!classify(&ExerciseKind::Pullups, 90.0));
    }

    #[test]
    fn unknown_exercise_fails_closed() {
        assert!(!classify(&ExerciseKind::parse("rowing"), 90.0));
        let registry = ProfileRegistry::default();
        assert!(!registry.classify(&ExerciseKind::parse("rowing"), 90.0));
    }

    #[test]
    fn invalid_angle_is_never_correct() {
        let registry = ProfileRegistry::default();
        for kind in registry.kinds() {
            assert!(!registry.classify(kind, 0.0), "{}", kind);
        }
    }

    #[test]
    fn default_registry_agrees_with_builtin_bands() {
        let registry = ProfileRegistry::default();
        for kind in [
            ExerciseKind::Pushups,
            ExerciseKind::Squats,
            ExerciseKind::Pullups,
        ] {
            for angle in [0.0, 70.0, 75.0, 80.0, 90.0, 100.0, 110.0, 120.0, 135.0, 150.0, 200.0] {
                assert_eq!(registry.classify(&kind, angle), classify(&kind, angle));
            }
        }
    }

    #[test]
    fn settings_override_band_and_keep_joint() {
        let mut settings = IndexMap::new();
        settings.insert(
            "squats".to_string(),
            ProfileSettings {
                joint: None,
                low: 60.0,
                high: 80.0,
            },
        );
        settings.insert(
            "lunges".to_string(),
            ProfileSettings {
                joint: Some([
                    KeypointName::LeftHip,
                    KeypointName::LeftKnee,
                    KeypointName::LeftAnkle,
                ]),
                low: 80.0,
                high: 100.0,
            },
        );

        let registry = ProfileRegistry::default().with_settings(&settings);

        assert!(registry.classify(&ExerciseKind::Squats, 65.0));
        assert!(!registry.classify(&ExerciseKind::Squats, 90.0));
        assert_eq!(
            registry.profile_for(&ExerciseKind::Squats).joint_triple,
            LEFT_ELBOW_TRIPLE
        );
        let lunges = registry.profile_for(&ExerciseKind::parse("lunges"));
        assert_eq!(lunges.joint_triple.1, KeypointName::LeftKnee);
        assert!(lunges.is_correct(90.0));
    }

    #[test]
    fn inverted_band_fails_validation() {
        let setting = ProfileSettings {
            joint: None,
            low: 100.0,
            high: 80.0,
        };
        assert!(setting.validate().is_err());
    }
}
