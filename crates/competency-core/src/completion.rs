//! Assessment completion state machine.
//!
//! Status is always re-derived from a fresh read of every rating for the
//! assessment, never updated incrementally, so recomputing is idempotent.
//!
//! | Tracker  | States                          | Completed when                     |
//! |----------|---------------------------------|------------------------------------|
//! | self     | pending, completed              | a self rating is submitted         |
//! | peer     | pending, partial, completed     | every assigned peer has submitted  |
//! | superior | pending, completed              | the supervisor has submitted       |
//! | overall  | pending, in_progress, completed | all three trackers are completed   |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::ValidationError;
use crate::model::{
    Assessment, AssessmentStatus, PeerBounds, PeerStatus, RaterType, Rating, SelfStatus,
    SuperiorStatus,
};

/// Facts about submitted ratings that the trackers are derived from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletionSnapshot {
    pub self_submitted: bool,
    pub assigned_peers: usize,
    pub completed_peers: usize,
    pub superior_submitted: bool,
}

impl CompletionSnapshot {
    /// Only distinct raters on the current roster count towards peer completion.
    pub fn from_ratings(assessment: &Assessment, ratings: &[Rating]) -> Self {
        let mut completed_peers = HashSet::new();
        let mut snapshot = CompletionSnapshot {
            assigned_peers: assessment.assigned_peer_rater_ids.len(),
            ..Default::default()
        };

        for rating in ratings
            .iter()
            .filter(|r| r.assessment_id == assessment.id && r.is_completed())
        {
            match rating.rater_type {
                RaterType::SelfRater => snapshot.self_submitted = true,
                RaterType::Superior => snapshot.superior_submitted = true,
                RaterType::Peer => {
                    if assessment.has_peer(&rating.rater_id) {
                        completed_peers.insert(rating.rater_id.as_str());
                    }
                }
            }
        }

        snapshot.completed_peers = completed_peers.len();
        snapshot
    }
}

pub fn peer_status(completed: usize, assigned: usize) -> PeerStatus {
    if assigned == 0 || completed == 0 {
        PeerStatus::Pending
    } else if completed >= assigned {
        PeerStatus::Completed
    } else {
        PeerStatus::Partial
    }
}

pub fn overall_status(
    self_status: SelfStatus,
    peer: PeerStatus,
    superior: SuperiorStatus,
) -> AssessmentStatus {
    let self_done = self_status == SelfStatus::Completed;
    let superior_done = superior == SuperiorStatus::Completed;

    if self_done && peer == PeerStatus::Completed && superior_done {
        AssessmentStatus::Completed
    } else if self_done || superior_done || peer != PeerStatus::Pending {
        AssessmentStatus::InProgress
    } else {
        AssessmentStatus::Pending
    }
}

/// Derived tracker values for an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionState {
    pub self_status: SelfStatus,
    pub peer_status: PeerStatus,
    pub superior_status: SuperiorStatus,
    pub status: AssessmentStatus,
    pub peer_completed_count: usize,
    pub peer_total_count: usize,
}

pub fn evaluate(snapshot: &CompletionSnapshot) -> CompletionState {
    let self_status = if snapshot.self_submitted {
        SelfStatus::Completed
    } else {
        SelfStatus::Pending
    };
    let superior_status = if snapshot.superior_submitted {
        SuperiorStatus::Completed
    } else {
        SuperiorStatus::Pending
    };
    let peer = peer_status(snapshot.completed_peers, snapshot.assigned_peers);

    CompletionState {
        self_status,
        peer_status: peer,
        superior_status,
        status: overall_status(self_status, peer, superior_status),
        peer_completed_count: snapshot.completed_peers,
        peer_total_count: snapshot.assigned_peers,
    }
}

/// What applying a [`CompletionState`] did to an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Updated,
    /// Entered `Completed` for the first time.
    Completed,
}

/// Write the derived trackers onto the assessment.
///
/// `completed_at` is stamped only on the first entry into `Completed`.
pub fn apply(assessment: &mut Assessment, state: &CompletionState, now: DateTime<Utc>) -> Transition {
    let before = current_state(assessment);
    if before == *state {
        return Transition::Unchanged;
    }

    assessment.self_status = state.self_status;
    assessment.peer_status = state.peer_status;
    assessment.superior_status = state.superior_status;
    assessment.status = state.status;
    assessment.peer_completed_count = state.peer_completed_count;
    assessment.peer_total_count = state.peer_total_count;
    assessment.updated_at = now;

    if state.status == AssessmentStatus::Completed && assessment.completed_at.is_none() {
        assessment.completed_at = Some(now);
        Transition::Completed
    } else {
        Transition::Updated
    }
}

fn current_state(assessment: &Assessment) -> CompletionState {
    CompletionState {
        self_status: assessment.self_status,
        peer_status: assessment.peer_status,
        superior_status: assessment.superior_status,
        status: assessment.status,
        peer_completed_count: assessment.peer_completed_count,
        peer_total_count: assessment.peer_total_count,
    }
}

/// Check a proposed peer roster before anything is written.
pub fn validate_roster(
    subject_user_id: &str,
    rater_ids: &[String],
    bounds: PeerBounds,
    department_name: &str,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for rater in rater_ids {
        if rater == subject_user_id {
            return Err(ValidationError::SelfAsPeer(rater.clone()));
        }
        if !seen.insert(rater.as_str()) {
            return Err(ValidationError::DuplicatePeerRater(rater.clone()));
        }
    }

    if !bounds.contains(rater_ids.len()) {
        return Err(ValidationError::PeerRosterSize {
            department: department_name.to_string(),
            min: bounds.min,
            max: bounds.max,
            count: rater_ids.len(),
        });
    }
    Ok(())
}
