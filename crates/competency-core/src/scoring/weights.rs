use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Relative weight of each rater source.
///
/// Weights need not sum to 1: only the sources present for a competency
/// contribute, and the score is divided by their combined weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaterWeights {
    #[serde(rename = "self")]
    pub self_weight: f64,
    pub peer: f64,
    pub superior: f64,
}

impl Default for RaterWeights {
    fn default() -> Self {
        Self {
            self_weight: 0.20,
            peer: 0.30,
            superior: 0.50,
        }
    }
}

impl RaterWeights {
    pub fn new(self_weight: f64, peer: f64, superior: f64) -> Result<Self, ValidationError> {
        let weights = Self {
            self_weight,
            peer,
            superior,
        };
        weights.validate()?;
        Ok(weights)
    }

    pub fn total(&self) -> f64 {
        self.self_weight + self.peer + self.superior
    }

    /// Reject negative, non-finite or all-zero weights.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (name, w) in [
            ("self", self.self_weight),
            ("peer", self.peer),
            ("superior", self.superior),
        ] {
            if !w.is_finite() || w < 0.0 {
                return Err(ValidationError::InvalidWeights(format!(
                    "{name} weight must be a non-negative number, got {w}"
                )));
            }
        }
        if self.total() <= 0.0 {
            return Err(ValidationError::InvalidWeights(
                "at least one weight must be positive".into(),
            ));
        }
        Ok(())
    }
}
