use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::App;
use crate::access::{Action, Principal};
use crate::completion::{self, CompletionSnapshot, Transition};
use crate::error::{AccessError, CoreError, Result, ValidationError};
use crate::model::{
    Assessment, AssessmentCycle, Competency, PeerStatus, Position, RaterType, Rating, RatingMap,
    SuperiorStatus, User,
};
use crate::storage::{DocumentStore, DocumentStoreExt, WriteBatch};

/// An outstanding peer rating for one rater.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerRequest {
    pub rating_id: String,
    pub assessment_id: String,
    pub cycle_id: String,
    pub subject_user_id: String,
    pub subject_name: String,
}

/// A direct report whose assessment still needs the supervisor's rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuperiorRequest {
    pub assessment_id: String,
    pub cycle_id: String,
    pub subject_user_id: String,
    pub subject_name: String,
}

/// One employee's peer roster as HR sees it for a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerAssignmentRow {
    pub user_id: String,
    pub name: String,
    pub department_id: String,
    pub department_name: String,
    pub min_peer_raters: u32,
    pub max_peer_raters: u32,
    pub assessment_id: Option<String>,
    pub assigned_peer_rater_ids: Vec<String>,
    pub peer_completed_count: usize,
    pub peer_status: PeerStatus,
}

impl<S: DocumentStore> App<S> {
    pub(crate) fn require_assessment(&self, assessment_id: &str) -> Result<Assessment> {
        self.store()
            .get::<Assessment>(assessment_id)?
            .ok_or_else(|| CoreError::not_found("assessments", assessment_id))
    }

    /// Every rating stored for an assessment, pending peer slots included.
    pub fn ratings_for(&self, assessment_id: &str) -> Result<Vec<Rating>> {
        self.store().query("assessment_id", assessment_id)
    }

    fn require_active(&self, cycle_id: &str) -> Result<AssessmentCycle> {
        let cycle = self.require_cycle(cycle_id)?;
        if !cycle.is_active() {
            return Err(ValidationError::CycleNotActive(cycle.name).into());
        }
        Ok(cycle)
    }

    /// Competencies rated in an assessment: the position's competencies whose
    /// type the cycle covers, in catalog order.
    pub fn required_competencies(
        &self,
        position: &Position,
        cycle: Option<&AssessmentCycle>,
    ) -> Result<Vec<Competency>> {
        Ok(self
            .competencies()?
            .into_iter()
            .filter(|c| position.applies_to(&c.id))
            .filter(|c| cycle.map_or(true, |cy| cy.covers_type(c.competency_type)))
            .collect())
    }

    fn required_ids(&self, assessment: &Assessment) -> Result<BTreeSet<String>> {
        let position: Position = self
            .store()
            .get(&assessment.subject_position_id)?
            .ok_or_else(|| CoreError::not_found("positions", &assessment.subject_position_id))?;
        let cycle = self.cycle(&assessment.cycle_id)?;
        Ok(self
            .required_competencies(&position, cycle.as_ref())?
            .into_iter()
            .map(|c| c.id)
            .collect())
    }

    /// Reject ratings outside the assessed set; with `complete`, every required id must be rated.
    fn check_ratings(&self, assessment: &Assessment, ratings: &RatingMap, complete: bool) -> Result<()> {
        if ratings.is_empty() {
            return Err(ValidationError::EmptyCollection("ratings".into()).into());
        }
        let required = self.required_ids(assessment)?;

        let unexpected: Vec<String> = ratings
            .keys()
            .filter(|id| !required.contains(*id))
            .cloned()
            .collect();
        if !unexpected.is_empty() {
            return Err(ValidationError::UnexpectedRatings(unexpected).into());
        }

        if complete {
            let missing: Vec<String> = required
                .iter()
                .filter(|id| !ratings.contains_key(*id))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(ValidationError::MissingRatings(missing).into());
            }
        }
        Ok(())
    }

    /// Get the subject's assessment for a cycle, creating it on first use.
    ///
    /// Without `cycle_id` the active cycle is used.
    pub fn start_assessment(
        &self,
        principal: &Principal,
        subject_id: &str,
        cycle_id: Option<&str>,
    ) -> Result<Assessment> {
        self.check(principal, Action::StartAssessment { subject_id })?;
        let cycle = match cycle_id {
            Some(id) => self.require_active(id)?,
            None => self.active_cycle()?.ok_or(ValidationError::NoActiveCycle)?,
        };
        let subject = self.require_user(subject_id)?;

        let id = Assessment::id_for(subject_id, &cycle.id);
        if let Some(existing) = self.store().get::<Assessment>(&id)? {
            return Ok(existing);
        }

        let mut assessment = Assessment::new(subject_id, &subject.position_id, &cycle.id, Self::now());
        assessment.superior_rater_id = subject.supervisor_id.clone();
        self.store().put(&assessment)?;
        tracing::info!(assessment = %assessment.id, "started assessment");
        Ok(assessment)
    }

    pub fn assessment(&self, principal: &Principal, assessment_id: &str) -> Result<Option<Assessment>> {
        let Some(assessment) = self.store().get::<Assessment>(assessment_id)? else {
            return Ok(None);
        };
        let subject = self.store().get::<User>(&assessment.subject_user_id)?;
        self.check(
            principal,
            Action::ViewAssessment {
                subject_id: &assessment.subject_user_id,
                supervisor_id: subject.as_ref().and_then(|u| u.supervisor_id.as_deref()),
            },
        )?;
        Ok(Some(assessment))
    }

    /// A subject's assessments, newest first.
    pub fn assessments_for_user(&self, principal: &Principal, user_id: &str) -> Result<Vec<Assessment>> {
        let subject = self.store().get::<User>(user_id)?;
        self.check(
            principal,
            Action::ViewAssessment {
                subject_id: user_id,
                supervisor_id: subject.as_ref().and_then(|u| u.supervisor_id.as_deref()),
            },
        )?;
        self.assessments_of(user_id)
    }

    pub(crate) fn assessments_of(&self, user_id: &str) -> Result<Vec<Assessment>> {
        let mut list: Vec<Assessment> = self.store().query("subject_user_id", user_id)?;
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    pub fn submit_self_rating(
        &self,
        principal: &Principal,
        assessment_id: &str,
        ratings: RatingMap,
    ) -> Result<Assessment> {
        let assessment = self.require_assessment(assessment_id)?;
        self.check(
            principal,
            Action::SubmitSelfRating {
                subject_id: &assessment.subject_user_id,
            },
        )?;
        self.require_active(&assessment.cycle_id)?;
        self.check_ratings(&assessment, &ratings, true)?;

        let rating = Rating::submitted(
            assessment_id,
            RaterType::SelfRater,
            &principal.user_id,
            ratings,
            Self::now(),
        );
        self.store().put(&rating)?;
        tracing::info!(assessment = %assessment_id, "self rating submitted");
        Ok(self.recompute_status(assessment_id)?.0)
    }

    /// Replace the peer roster of an assessment in an active cycle.
    ///
    /// The roster is validated against the subject's department bounds before
    /// anything is written; the ratings and the assessment are then updated in
    /// one transaction. Completed ratings of raters who stay on the roster are
    /// kept, ratings of removed raters are deleted.
    pub fn assign_peer_raters(
        &self,
        principal: &Principal,
        assessment_id: &str,
        rater_ids: Vec<String>,
    ) -> Result<Assessment> {
        self.check(principal, Action::AssignPeers)?;
        let mut assessment = self.require_assessment(assessment_id)?;
        self.require_active(&assessment.cycle_id)?;
        let subject = self.require_user(&assessment.subject_user_id)?;
        let (bounds, department_name) = self.peer_bounds_for(&subject.department_id)?;

        if let Err(e) = completion::validate_roster(&subject.id, &rater_ids, bounds, &department_name) {
            tracing::warn!(assessment = %assessment_id, "rejected peer roster: {e}");
            return Err(e.into());
        }
        for rater in &rater_ids {
            self.require_user(rater)?;
        }

        let now = Self::now();
        let existing = self.ratings_for(assessment_id)?;
        let mut batch = WriteBatch::new();
        let mut kept = Vec::with_capacity(existing.len() + rater_ids.len());

        for rating in existing {
            if rating.rater_type == RaterType::Peer && !rater_ids.contains(&rating.rater_id) {
                batch.delete::<Rating>(&rating.id);
            } else {
                kept.push(rating);
            }
        }
        for rater in &rater_ids {
            let has_slot = kept
                .iter()
                .any(|r| r.rater_type == RaterType::Peer && &r.rater_id == rater);
            if !has_slot {
                let slot = Rating::pending_peer(assessment_id, rater, now);
                batch.put(&slot)?;
                kept.push(slot);
            }
        }

        assessment.assigned_peer_rater_ids = rater_ids;
        let state = completion::evaluate(&CompletionSnapshot::from_ratings(&assessment, &kept));
        completion::apply(&mut assessment, &state, now);
        assessment.updated_at = now;
        batch.put(&assessment)?;

        self.store().commit(batch)?;
        tracing::info!(
            assessment = %assessment_id,
            peers = assessment.assigned_peer_rater_ids.len(),
            "assigned peer raters"
        );
        Ok(assessment)
    }

    /// Peer ratings a rater still owes, oldest assignment first.
    pub fn pending_peer_requests(&self, principal: &Principal, rater_id: &str) -> Result<Vec<PeerRequest>> {
        self.check(principal, Action::ViewUser { user_id: rater_id })?;
        let mut slots: Vec<Rating> = self.store().query("rater_id", rater_id)?;
        slots.retain(|r| r.rater_type == RaterType::Peer && !r.is_completed());
        slots.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        let mut requests = Vec::with_capacity(slots.len());
        for slot in slots {
            let Some(assessment) = self.store().get::<Assessment>(&slot.assessment_id)? else {
                continue;
            };
            if !assessment.has_peer(rater_id) {
                continue;
            }
            let subject_name = self
                .store()
                .get::<User>(&assessment.subject_user_id)?
                .map(|u| u.name)
                .unwrap_or_default();
            requests.push(PeerRequest {
                rating_id: slot.id,
                assessment_id: assessment.id,
                cycle_id: assessment.cycle_id,
                subject_user_id: assessment.subject_user_id,
                subject_name,
            });
        }
        Ok(requests)
    }

    /// Submit the caller's peer rating. Only raters on the roster may submit.
    pub fn submit_peer_rating(
        &self,
        principal: &Principal,
        assessment_id: &str,
        ratings: RatingMap,
    ) -> Result<Assessment> {
        self.check(principal, Action::SubmitPeerRating)?;
        let assessment = self.require_assessment(assessment_id)?;
        if !assessment.has_peer(&principal.user_id) {
            tracing::warn!(assessment = %assessment_id, rater = %principal.user_id, "peer not on roster");
            return Err(AccessError::NotAssignedPeer {
                rater: principal.user_id.clone(),
                assessment: assessment_id.to_string(),
            }
            .into());
        }
        self.require_active(&assessment.cycle_id)?;
        self.check_ratings(&assessment, &ratings, false)?;

        let now = Self::now();
        let slot_id = Rating::id_for(assessment_id, RaterType::Peer, &principal.user_id);
        let created_at = self
            .store()
            .get::<Rating>(&slot_id)?
            .map(|r| r.created_at)
            .unwrap_or(now);
        let mut rating = Rating::submitted(assessment_id, RaterType::Peer, &principal.user_id, ratings, now);
        rating.created_at = created_at;
        self.store().put(&rating)?;
        tracing::info!(assessment = %assessment_id, "peer rating submitted");
        Ok(self.recompute_status(assessment_id)?.0)
    }

    /// Submit the superior rating: the subject's direct supervisor, or HR/Admin
    /// other than the subject.
    pub fn submit_superior_rating(
        &self,
        principal: &Principal,
        assessment_id: &str,
        ratings: RatingMap,
    ) -> Result<Assessment> {
        let assessment = self.require_assessment(assessment_id)?;
        let subject = self.require_user(&assessment.subject_user_id)?;
        self.check(
            principal,
            Action::SubmitSuperiorRating {
                subject_id: &subject.id,
                supervisor_id: subject.supervisor_id.as_deref(),
            },
        )?;
        self.require_active(&assessment.cycle_id)?;
        self.check_ratings(&assessment, &ratings, false)?;

        let rating = Rating::submitted(
            assessment_id,
            RaterType::Superior,
            &principal.user_id,
            ratings,
            Self::now(),
        );
        self.store().put(&rating)?;

        let mut updated = self.require_assessment(assessment_id)?;
        if updated.superior_rater_id.as_deref() != Some(principal.user_id.as_str()) {
            updated.superior_rater_id = Some(principal.user_id.clone());
            self.store().put(&updated)?;
        }
        tracing::info!(assessment = %assessment_id, "superior rating submitted");
        Ok(self.recompute_status(assessment_id)?.0)
    }

    /// Direct reports whose assessment in the active cycle lacks the superior rating.
    pub fn pending_superior_ratings(
        &self,
        principal: &Principal,
        supervisor_id: &str,
    ) -> Result<Vec<SuperiorRequest>> {
        self.check(principal, Action::ViewTeam { supervisor_id })?;
        let Some(cycle) = self.active_cycle()? else {
            return Ok(Vec::new());
        };

        let mut pending = Vec::new();
        for report in self.reports_of(supervisor_id)? {
            let id = Assessment::id_for(&report.id, &cycle.id);
            let Some(assessment) = self.store().get::<Assessment>(&id)? else {
                continue;
            };
            if assessment.superior_status == SuperiorStatus::Pending {
                pending.push(SuperiorRequest {
                    assessment_id: assessment.id,
                    cycle_id: cycle.id.clone(),
                    subject_user_id: report.id,
                    subject_name: report.name,
                });
            }
        }
        Ok(pending)
    }

    /// Re-derive the trackers from a fresh read of every rating and persist them if they changed.
    pub fn recompute_status(&self, assessment_id: &str) -> Result<(Assessment, Transition)> {
        let mut assessment = self.require_assessment(assessment_id)?;
        let ratings = self.ratings_for(assessment_id)?;
        let state = completion::evaluate(&CompletionSnapshot::from_ratings(&assessment, &ratings));

        let transition = completion::apply(&mut assessment, &state, Self::now());
        match transition {
            Transition::Unchanged => {}
            Transition::Updated => {
                self.store().put(&assessment)?;
                tracing::debug!(assessment = %assessment_id, status = ?assessment.status, "status updated");
            }
            Transition::Completed => {
                self.store().put(&assessment)?;
                tracing::info!(assessment = %assessment_id, "assessment completed");
            }
        }
        Ok((assessment, transition))
    }

    /// Every user's peer roster for a cycle (the active cycle when `cycle_id` is `None`).
    pub fn peer_assignment_overview(
        &self,
        principal: &Principal,
        cycle_id: Option<&str>,
    ) -> Result<Vec<PeerAssignmentRow>> {
        self.check(principal, Action::AssignPeers)?;
        let cycle = match cycle_id {
            Some(id) => self.require_cycle(id)?,
            None => self.active_cycle()?.ok_or(ValidationError::NoActiveCycle)?,
        };

        let mut rows = Vec::new();
        for user in self.all_users()? {
            let (bounds, department_name) = self.peer_bounds_for(&user.department_id)?;
            let assessment = self
                .store()
                .get::<Assessment>(&Assessment::id_for(&user.id, &cycle.id))?;
            rows.push(PeerAssignmentRow {
                min_peer_raters: bounds.min,
                max_peer_raters: bounds.max,
                department_name,
                assessment_id: assessment.as_ref().map(|a| a.id.clone()),
                assigned_peer_rater_ids: assessment
                    .as_ref()
                    .map(|a| a.assigned_peer_rater_ids.clone())
                    .unwrap_or_default(),
                peer_completed_count: assessment.as_ref().map_or(0, |a| a.peer_completed_count),
                peer_status: assessment.as_ref().map(|a| a.peer_status).unwrap_or_default(),
                user_id: user.id,
                name: user.name,
                department_id: user.department_id,
            });
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AssessmentStatus;
    use crate::service::fixtures::{uniform, Fixture, CORE};

    fn started(fx: &Fixture) -> Assessment {
        fx.app
            .start_assessment(&fx.as_user("ana"), "ana", None)
            .unwrap()
    }

    fn peers(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn start_is_idempotent_and_records_supervisor() {
        let fx = Fixture::new();
        let first = started(&fx);
        assert_eq!(first.id, Assessment::id_for("ana", &fx.cycle.id));
        assert_eq!(first.superior_rater_id.as_deref(), Some("boss"));
        assert_eq!(first.status, AssessmentStatus::Pending);

        let again = started(&fx);
        assert_eq!(again.created_at, first.created_at);
        assert_eq!(
            fx.app.assessments_for_user(&fx.as_user("ana"), "ana").unwrap().len(),
            1
        );
    }

    #[test]
    fn start_requires_an_active_cycle() {
        let fx = Fixture::new();
        fx.app.close_cycle(&Principal::system(), &fx.cycle.id).unwrap();
        let err = fx
            .app
            .start_assessment(&fx.as_user("ana"), "ana", None)
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::NoActiveCycle)));

        let err = fx
            .app
            .start_assessment(&fx.as_user("ana"), "ana", Some(&fx.cycle.id))
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::CycleNotActive(_))));
    }

    #[test]
    fn self_rating_must_cover_required_competencies() {
        let fx = Fixture::new();
        let a = started(&fx);
        let ana = fx.as_user("ana");

        let err = fx
            .app
            .submit_self_rating(&ana, &a.id, uniform(&CORE[..3], 2))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: Missing ratings for: C4, C5"
        );

        let err = fx
            .app
            .submit_self_rating(&ana, &a.id, uniform(&["C1", "C2", "C3", "C4", "C5", "L1"], 2))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::UnexpectedRatings(ref ids)) if ids == &["L1"]
        ));

        let updated = fx
            .app
            .submit_self_rating(&ana, &a.id, uniform(&CORE, 2))
            .unwrap();
        assert_eq!(updated.self_status, crate::model::SelfStatus::Completed);
        assert_eq!(updated.status, AssessmentStatus::InProgress);
    }

    #[test]
    fn only_the_subject_submits_a_self_rating() {
        let fx = Fixture::new();
        let a = started(&fx);
        let err = fx
            .app
            .submit_self_rating(&fx.hr(), &a.id, uniform(&CORE, 2))
            .unwrap_err();
        assert!(matches!(err, CoreError::Access(AccessError::Forbidden { .. })));
    }

    #[test]
    fn rejected_roster_writes_nothing() {
        let fx = Fixture::new();
        let a = started(&fx);

        let err = fx
            .app
            .assign_peer_raters(&fx.hr(), &a.id, peers(&["p1"]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: Legal Unit requires between 2 and 3 peer raters, got 1"
        );
        assert!(fx
            .app
            .assign_peer_raters(&fx.hr(), &a.id, peers(&["p1", "ana"]))
            .is_err());
        assert!(fx
            .app
            .assign_peer_raters(&fx.hr(), &a.id, peers(&["p1", "ghost"]))
            .is_err());

        assert!(fx.app.ratings_for(&a.id).unwrap().is_empty());
        assert!(fx.app.require_assessment(&a.id).unwrap().assigned_peer_rater_ids.is_empty());
    }

    #[test]
    fn roster_creates_pending_slots_and_requests() {
        let fx = Fixture::new();
        let a = started(&fx);
        let assigned = fx
            .app
            .assign_peer_raters(&fx.hr(), &a.id, peers(&["p1", "p2"]))
            .unwrap();
        assert_eq!(assigned.peer_total_count, 2);
        assert_eq!(assigned.peer_status, PeerStatus::Pending);

        let requests = fx
            .app
            .pending_peer_requests(&fx.as_user("p1"), "p1")
            .unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].subject_user_id, "ana");
        assert_eq!(requests[0].subject_name, "ANA");
        assert!(fx
            .app
            .pending_peer_requests(&fx.as_user("p3"), "p3")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn reassignment_keeps_staying_raters_and_drops_removed_ones() {
        let fx = Fixture::new();
        let a = started(&fx);
        fx.app
            .assign_peer_raters(&fx.hr(), &a.id, peers(&["p1", "p2"]))
            .unwrap();
        fx.app
            .submit_peer_rating(&fx.as_user("p1"), &a.id, uniform(&CORE, 3))
            .unwrap();
        fx.app
            .submit_peer_rating(&fx.as_user("p2"), &a.id, uniform(&CORE, 3))
            .unwrap();

        let updated = fx
            .app
            .assign_peer_raters(&fx.hr(), &a.id, peers(&["p1", "p3"]))
            .unwrap();
        assert_eq!(updated.peer_completed_count, 1);
        assert_eq!(updated.peer_status, PeerStatus::Partial);

        let ratings = fx.app.ratings_for(&a.id).unwrap();
        assert!(ratings.iter().all(|r| r.rater_id != "p2"));
        assert!(ratings
            .iter()
            .any(|r| r.rater_id == "p1" && r.is_completed()));
    }

    #[test]
    fn peers_off_the_roster_cannot_submit() {
        let fx = Fixture::new();
        let a = started(&fx);
        fx.app
            .assign_peer_raters(&fx.hr(), &a.id, peers(&["p1", "p2"]))
            .unwrap();
        let err = fx
            .app
            .submit_peer_rating(&fx.as_user("p4"), &a.id, uniform(&CORE, 3))
            .unwrap_err();
        assert!(matches!(err, CoreError::Access(AccessError::NotAssignedPeer { .. })));

        let err = fx
            .app
            .submit_peer_rating(&fx.as_user("p1"), &a.id, RatingMap::new())
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::EmptyCollection(_))));
    }

    #[test]
    fn full_participation_completes_the_assessment() {
        let fx = Fixture::new();
        let a = started(&fx);
        fx.app
            .assign_peer_raters(&fx.hr(), &a.id, peers(&["p1", "p2"]))
            .unwrap();

        assert_eq!(
            fx.app
                .pending_superior_ratings(&fx.as_user("boss"), "boss")
                .unwrap()
                .len(),
            1
        );

        fx.app
            .submit_self_rating(&fx.as_user("ana"), &a.id, uniform(&CORE, 2))
            .unwrap();
        fx.app
            .submit_peer_rating(&fx.as_user("p1"), &a.id, uniform(&CORE, 3))
            .unwrap();
        let partial = fx
            .app
            .submit_peer_rating(&fx.as_user("p2"), &a.id, uniform(&CORE[..2], 3))
            .unwrap();
        assert_eq!(partial.peer_status, PeerStatus::Completed);
        assert_eq!(partial.status, AssessmentStatus::InProgress);

        let done = fx
            .app
            .submit_superior_rating(&fx.as_user("boss"), &a.id, uniform(&CORE, 3))
            .unwrap();
        assert_eq!(done.status, AssessmentStatus::Completed);
        assert!(done.completed_at.is_some());
        assert!(fx
            .app
            .pending_superior_ratings(&fx.as_user("boss"), "boss")
            .unwrap()
            .is_empty());

        let (again, transition) = fx.app.recompute_status(&a.id).unwrap();
        assert_eq!(transition, Transition::Unchanged);
        assert_eq!(again.completed_at, done.completed_at);
    }

    #[test]
    fn roster_is_frozen_once_the_cycle_closes() {
        let fx = Fixture::new();
        let a = started(&fx);
        fx.app
            .assign_peer_raters(&fx.hr(), &a.id, peers(&["p1", "p2"]))
            .unwrap();
        fx.app
            .submit_self_rating(&fx.as_user("ana"), &a.id, uniform(&CORE, 2))
            .unwrap();
        for rater in ["p1", "p2"] {
            fx.app
                .submit_peer_rating(&fx.as_user(rater), &a.id, uniform(&CORE, 3))
                .unwrap();
        }
        let done = fx
            .app
            .submit_superior_rating(&fx.as_user("boss"), &a.id, uniform(&CORE, 4))
            .unwrap();
        assert_eq!(done.status, AssessmentStatus::Completed);

        fx.app.close_cycle(&Principal::system(), &fx.cycle.id).unwrap();
        let err = fx
            .app
            .assign_peer_raters(&fx.hr(), &a.id, peers(&["p3", "p4"]))
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::CycleNotActive(_))));

        let kept = fx.app.require_assessment(&a.id).unwrap();
        assert_eq!(kept.status, AssessmentStatus::Completed);
        assert_eq!(kept.assigned_peer_rater_ids, peers(&["p1", "p2"]));
        assert_eq!(kept.completed_at, done.completed_at);
        let ratings = fx.app.ratings_for(&a.id).unwrap();
        assert_eq!(ratings.len(), 4);
        assert!(ratings.iter().all(|r| r.is_completed()));
    }

    #[test]
    fn superior_rating_is_limited_to_the_supervisor_and_hr() {
        let fx = Fixture::new();
        let a = started(&fx);
        let err = fx
            .app
            .submit_superior_rating(&fx.as_user("p1"), &a.id, uniform(&CORE, 3))
            .unwrap_err();
        assert!(matches!(err, CoreError::Access(_)));

        let updated = fx
            .app
            .submit_superior_rating(&fx.hr(), &a.id, uniform(&CORE, 3))
            .unwrap();
        assert_eq!(updated.superior_rater_id.as_deref(), Some("hr"));
    }

    #[test]
    fn hr_cannot_rate_their_own_assessment_as_superior() {
        let fx = Fixture::new();
        let own = fx.app.start_assessment(&fx.hr(), "hr", None).unwrap();
        let err = fx
            .app
            .submit_superior_rating(&fx.hr(), &own.id, uniform(&CORE, 4))
            .unwrap_err();
        assert!(matches!(err, CoreError::Access(AccessError::Forbidden { .. })));
        assert!(fx.app.ratings_for(&own.id).unwrap().is_empty());
        assert_eq!(
            fx.app.require_assessment(&own.id).unwrap().superior_rater_id.as_deref(),
            Some("boss")
        );

        let rated = fx
            .app
            .submit_superior_rating(&fx.as_user("boss"), &own.id, uniform(&CORE, 3))
            .unwrap();
        assert_eq!(rated.superior_rater_id.as_deref(), Some("boss"));
    }

    #[test]
    fn overview_lists_every_user_with_department_bounds() {
        let fx = Fixture::new();
        let a = started(&fx);
        fx.app
            .assign_peer_raters(&fx.hr(), &a.id, peers(&["p1", "p2", "p3"]))
            .unwrap();

        let rows = fx.app.peer_assignment_overview(&fx.hr(), None).unwrap();
        assert_eq!(rows.len(), 7);
        let ana = rows.iter().find(|r| r.user_id == "ana").unwrap();
        assert_eq!((ana.min_peer_raters, ana.max_peer_raters), (2, 3));
        assert_eq!(ana.assigned_peer_rater_ids.len(), 3);
        assert_eq!(ana.department_name, "Legal Unit");
        let p1 = rows.iter().find(|r| r.user_id == "p1").unwrap();
        assert!(p1.assessment_id.is_none());

        assert!(fx
            .app
            .peer_assignment_overview(&fx.as_user("ana"), None)
            .is_err());
    }
}
