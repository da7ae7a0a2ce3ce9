//! Competency catalog types and the checked proficiency [`Level`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// A proficiency level, always within `1..=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Level(u8);

impl Level {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 4;

    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ValidationError::LevelOutOfRange(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0)
    }

    /// Display name of the level (Basic, Intermediate, Advanced, Superior).
    pub fn name(self) -> &'static str {
        level_name(self.as_f64())
    }
}

impl TryFrom<i64> for Level {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Level::new(value)
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of the proficiency level nearest to a (possibly fractional) score.
///
/// Scores below 0.5 read as "Not rated".
pub fn level_name(score: f64) -> &'static str {
    match score.round() as i64 {
        i64::MIN..=0 => "Not rated",
        1 => "Basic",
        2 => "Intermediate",
        3 => "Advanced",
        _ => "Superior",
    }
}

/// Competency family. Ordering follows catalog presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CompetencyType {
    Core,
    Leadership,
    Functional,
}

impl CompetencyType {
    pub fn as_str(self) -> &'static str {
        match self {
            CompetencyType::Core => "Core",
            CompetencyType::Leadership => "Leadership",
            CompetencyType::Functional => "Functional",
        }
    }

    pub fn all() -> [CompetencyType; 3] {
        [
            CompetencyType::Core,
            CompetencyType::Leadership,
            CompetencyType::Functional,
        ]
    }
}

impl std::str::FromStr for CompetencyType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "core" => Ok(CompetencyType::Core),
            "leadership" => Ok(CompetencyType::Leadership),
            "functional" => Ok(CompetencyType::Functional),
            other => Err(ValidationError::InvalidValue {
                field: "competency_type".into(),
                message: format!("unknown competency type '{other}'"),
            }),
        }
    }
}

impl fmt::Display for CompetencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rung of a competency's proficiency ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProficiencyLevel {
    pub level: Level,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub indicators: Vec<String>,
}

/// A competency from the reference catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competency {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub competency_type: CompetencyType,
    pub description: String,
    #[serde(default)]
    pub proficiency_levels: Vec<ProficiencyLevel>,
}

impl Competency {
    /// Sort key used wherever competencies are listed.
    pub fn catalog_order(&self) -> (CompetencyType, &str) {
        (self.competency_type, self.id.as_str())
    }

    pub fn proficiency(&self, level: Level) -> Option<&ProficiencyLevel> {
        self.proficiency_levels.iter().find(|p| p.level == level)
    }
}
