//! Assessments and the ratings submitted against them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Level;

/// Competency id -> rated level.
pub type RatingMap = BTreeMap<String, Level>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfStatus {
    #[default]
    Pending,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerStatus {
    #[default]
    Pending,
    Partial,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuperiorStatus {
    #[default]
    Pending,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

/// One subject's assessment within one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: String,
    pub cycle_id: String,
    pub subject_user_id: String,
    pub subject_position_id: String,
    #[serde(default)]
    pub self_status: SelfStatus,
    #[serde(default)]
    pub peer_status: PeerStatus,
    #[serde(default)]
    pub superior_status: SuperiorStatus,
    #[serde(default)]
    pub status: AssessmentStatus,
    #[serde(default)]
    pub assigned_peer_rater_ids: Vec<String>,
    #[serde(default)]
    pub peer_completed_count: usize,
    #[serde(default)]
    pub peer_total_count: usize,
    #[serde(default)]
    pub superior_rater_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Assessment {
    /// Id of the single assessment a subject has in a cycle.
    pub fn id_for(subject_user_id: &str, cycle_id: &str) -> String {
        format!("assessment-{subject_user_id}-{cycle_id}")
    }

    pub fn new(
        subject_user_id: &str,
        subject_position_id: &str,
        cycle_id: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Self::id_for(subject_user_id, cycle_id),
            cycle_id: cycle_id.to_string(),
            subject_user_id: subject_user_id.to_string(),
            subject_position_id: subject_position_id.to_string(),
            self_status: SelfStatus::Pending,
            peer_status: PeerStatus::Pending,
            superior_status: SuperiorStatus::Pending,
            status: AssessmentStatus::Pending,
            assigned_peer_rater_ids: Vec::new(),
            peer_completed_count: 0,
            peer_total_count: 0,
            superior_rater_id: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn has_peer(&self, rater_id: &str) -> bool {
        self.assigned_peer_rater_ids.iter().any(|id| id == rater_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaterType {
    #[serde(rename = "self")]
    SelfRater,
    Peer,
    Superior,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingStatus {
    #[default]
    Pending,
    Completed,
}

/// A rater's levels for the competencies of one assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub id: String,
    pub assessment_id: String,
    pub rater_id: String,
    pub rater_type: RaterType,
    pub status: RatingStatus,
    #[serde(default)]
    pub ratings: RatingMap,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Rating {
    /// Deterministic id: self and superior ratings overwrite, peers get one slot each.
    pub fn id_for(assessment_id: &str, rater_type: RaterType, rater_id: &str) -> String {
        match rater_type {
            RaterType::SelfRater => format!("self-{assessment_id}"),
            RaterType::Superior => format!("superior-{assessment_id}"),
            RaterType::Peer => format!("peer-{assessment_id}-{rater_id}"),
        }
    }

    /// A pending peer slot created when the roster is assigned.
    pub fn pending_peer(assessment_id: &str, rater_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Self::id_for(assessment_id, RaterType::Peer, rater_id),
            assessment_id: assessment_id.to_string(),
            rater_id: rater_id.to_string(),
            rater_type: RaterType::Peer,
            status: RatingStatus::Pending,
            ratings: RatingMap::new(),
            created_at: now,
            submitted_at: None,
        }
    }

    pub fn submitted(
        assessment_id: &str,
        rater_type: RaterType,
        rater_id: &str,
        ratings: RatingMap,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Self::id_for(assessment_id, rater_type, rater_id),
            assessment_id: assessment_id.to_string(),
            rater_id: rater_id.to_string(),
            rater_type,
            status: RatingStatus::Completed,
            ratings,
            created_at: now,
            submitted_at: Some(now),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == RatingStatus::Completed
    }

    pub fn level_for(&self, competency_id: &str) -> Option<Level> {
        self.ratings.get(competency_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rater_type_serializes_self() {
        assert_eq!(
            serde_json::to_string(&RaterType::SelfRater).unwrap(),
            "\"self\""
        );
        assert_eq!(
            serde_json::from_str::<RaterType>("\"superior\"").unwrap(),
            RaterType::Superior
        );
    }

    #[test]
    fn status_names_are_snake_case() {
        assert_eq!(
            serde_json::to_string(&AssessmentStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(
            serde_json::to_string(&PeerStatus::Partial).unwrap(),
            "\"partial\""
        );
    }

    #[test]
    fn rating_ids_are_deterministic() {
        assert_eq!(
            Rating::id_for("a1", RaterType::SelfRater, "u1"),
            "self-a1"
        );
        assert_eq!(Rating::id_for("a1", RaterType::Peer, "u2"), "peer-a1-u2");
        assert_eq!(
            Rating::id_for("a1", RaterType::Superior, "boss"),
            "superior-a1"
        );
    }
}
