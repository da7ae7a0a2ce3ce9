use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::CompetencyType;
use crate::scoring::RaterWeights;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    Upcoming,
    Active,
    Completed,
}

/// A time-boxed period during which ratings are collected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentCycle {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: CycleStatus,
    pub competency_types: Vec<CompetencyType>,
    #[serde(default)]
    pub weights: RaterWeights,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AssessmentCycle {
    pub fn is_active(&self) -> bool {
        self.status == CycleStatus::Active
    }

    pub fn covers_type(&self, competency_type: CompetencyType) -> bool {
        self.competency_types.contains(&competency_type)
    }
}
