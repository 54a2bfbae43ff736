use serde::{Deserialize, Serialize};
use std::fmt;

/// The exercise a session is scoring. Unrecognised names are kept as `Other`
/// so a session can still be started for them; they never classify correct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExerciseKind {
    Pushups,
    Squats,
    Pullups,
    Other(String),
}

impl ExerciseKind {
    pub fn parse(name: &str) -> Self {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            "pushups" => ExerciseKind::Pushups,
            "squats" => ExerciseKind::Squats,
            "pullups" => ExerciseKind::Pullups,
            _ => ExerciseKind::Other(name),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ExerciseKind::Pushups => "pushups",
            ExerciseKind::Squats => "squats",
            ExerciseKind::Pullups => "pullups",
            ExerciseKind::Other(name) => name,
        }
    }
}

impl From<&str> for ExerciseKind {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl From<String> for ExerciseKind {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<ExerciseKind> for String {
    fn from(kind: ExerciseKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
