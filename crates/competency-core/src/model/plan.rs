//! Individual development plans derived from gap analysis.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    #[default]
    Draft,
    Submitted,
    Approved,
    Rejected,
    InProgress,
    Completed,
}

impl PlanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PlanStatus::Draft => "draft",
            PlanStatus::Submitted => "submitted",
            PlanStatus::Approved => "approved",
            PlanStatus::Rejected => "rejected",
            PlanStatus::InProgress => "in_progress",
            PlanStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Training,
    Mentoring,
    JobRotation,
    SelfStudy,
    Coaching,
    SpecialProject,
}

impl std::str::FromStr for ActivityKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "training" => Ok(ActivityKind::Training),
            "mentoring" => Ok(ActivityKind::Mentoring),
            "job_rotation" => Ok(ActivityKind::JobRotation),
            "self_study" => Ok(ActivityKind::SelfStudy),
            "coaching" => Ok(ActivityKind::Coaching),
            "special_project" => Ok(ActivityKind::SpecialProject),
            other => Err(ValidationError::InvalidValue {
                field: "kind".into(),
                message: format!("unknown activity kind '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    #[default]
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

impl ActivityStatus {
    pub fn is_closed(self) -> bool {
        matches!(self, ActivityStatus::Completed | ActivityStatus::Cancelled)
    }
}

impl std::str::FromStr for ActivityStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "planned" => Ok(ActivityStatus::Planned),
            "in_progress" => Ok(ActivityStatus::InProgress),
            "completed" => Ok(ActivityStatus::Completed),
            "cancelled" => Ok(ActivityStatus::Cancelled),
            other => Err(ValidationError::InvalidValue {
                field: "status".into(),
                message: format!("unknown activity status '{other}'"),
            }),
        }
    }
}

/// A competency the plan targets, captured from the gap analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentNeed {
    pub competency_id: String,
    pub competency_name: String,
    pub gap: f64,
    pub current_level: f64,
    pub target_level: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentActivity {
    pub id: String,
    pub title: String,
    pub kind: ActivityKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub target_competency_ids: Vec<String>,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: ActivityStatus,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentPlan {
    pub id: String,
    pub user_id: String,
    pub assessment_id: String,
    pub cycle_id: String,
    #[serde(default)]
    pub status: PlanStatus,
    #[serde(default)]
    pub development_needs: Vec<DevelopmentNeed>,
    #[serde(default)]
    pub activities: Vec<DevelopmentActivity>,
    #[serde(default)]
    pub approved_by: Option<String>,
    #[serde(default)]
    pub supervisor_comments: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl DevelopmentPlan {
    pub fn activity_mut(&mut self, activity_id: &str) -> Option<&mut DevelopmentActivity> {
        self.activities.iter_mut().find(|a| a.id == activity_id)
    }

    /// Move the plan to `to`, rejecting transitions the review flow does not allow.
    pub fn transition(&mut self, to: PlanStatus) -> Result<(), ValidationError> {
        use PlanStatus::*;
        let allowed = matches!(
            (self.status, to),
            (Draft | Rejected, Submitted)
                | (Submitted, Approved | Rejected)
                | (Approved, InProgress)
                | (Approved | InProgress, Completed)
        );
        if !allowed {
            return Err(ValidationError::InvalidTransition {
                entity: "development plan",
                from: self.status.as_str().into(),
                to: to.as_str().into(),
            });
        }
        self.status = to;
        Ok(())
    }

    /// Advance an approved plan as its activities progress.
    ///
    /// Returns the new status when it changed.
    pub fn sync_with_activities(&mut self) -> Option<PlanStatus> {
        let any_started = self
            .activities
            .iter()
            .any(|a| a.status != ActivityStatus::Planned);
        let all_closed = !self.activities.is_empty()
            && self.activities.iter().all(|a| a.status.is_closed())
            && self
                .activities
                .iter()
                .any(|a| a.status == ActivityStatus::Completed);

        let target = match self.status {
            PlanStatus::Approved if all_closed => PlanStatus::Completed,
            PlanStatus::Approved if any_started => PlanStatus::InProgress,
            PlanStatus::InProgress if all_closed => PlanStatus::Completed,
            _ => return None,
        };
        self.status = target;
        Some(target)
    }
}
