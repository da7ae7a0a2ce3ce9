use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::App;
use crate::access::{Action, Principal};
use crate::error::{CoreError, Result, ValidationError};
use crate::model::{
    ActivityKind, ActivityStatus, DevelopmentActivity, DevelopmentNeed, DevelopmentPlan,
    PlanStatus, User,
};
use crate::storage::{DocumentStore, DocumentStoreExt};

/// Input for [`App::add_activity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewActivity {
    pub title: String,
    pub kind: ActivityKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub target_competency_ids: Vec<String>,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
}

/// Partial update for [`App::update_activity`]; `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityUpdate {
    #[serde(default)]
    pub status: Option<ActivityStatus>,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn activity_status_name(status: ActivityStatus) -> &'static str {
    match status {
        ActivityStatus::Planned => "planned",
        ActivityStatus::InProgress => "in_progress",
        ActivityStatus::Completed => "completed",
        ActivityStatus::Cancelled => "cancelled",
    }
}

impl<S: DocumentStore> App<S> {
    fn require_plan(&self, plan_id: &str) -> Result<DevelopmentPlan> {
        self.store()
            .get::<DevelopmentPlan>(plan_id)?
            .ok_or_else(|| CoreError::not_found("development_plans", plan_id))
    }

    fn check_plan_owner(&self, principal: &Principal, plan: &DevelopmentPlan) -> Result<()> {
        self.check(
            principal,
            Action::ManagePlan {
                owner_id: &plan.user_id,
            },
        )
    }

    /// Draft a plan from the development needs of an assessment.
    ///
    /// An assessment has at most one plan; asking again returns the existing one.
    pub fn create_development_plan(
        &self,
        principal: &Principal,
        assessment_id: &str,
    ) -> Result<DevelopmentPlan> {
        let assessment = self.require_assessment(assessment_id)?;
        self.check(
            principal,
            Action::ManagePlan {
                owner_id: &assessment.subject_user_id,
            },
        )?;

        let existing: Vec<DevelopmentPlan> = self.store().query("assessment_id", assessment_id)?;
        if let Some(plan) = existing.into_iter().max_by_key(|p| p.created_at) {
            return Ok(plan);
        }

        let analysis = self.analyze_assessment(assessment_id, None)?;
        let development_needs = analysis
            .development_needs()
            .map(|r| DevelopmentNeed {
                competency_id: r.competency_id.clone(),
                competency_name: r.competency_name.clone(),
                gap: r.gap,
                current_level: r.weighted_score,
                target_level: r.required_level.get(),
            })
            .collect();

        let now = Self::now();
        let plan = DevelopmentPlan {
            id: Uuid::new_v4().to_string(),
            user_id: assessment.subject_user_id,
            assessment_id: assessment.id,
            cycle_id: assessment.cycle_id,
            status: PlanStatus::Draft,
            development_needs,
            activities: Vec::new(),
            approved_by: None,
            supervisor_comments: String::new(),
            created_at: now,
            updated_at: now,
            submitted_at: None,
            reviewed_at: None,
        };
        self.store().put(&plan)?;
        tracing::info!(
            plan = %plan.id,
            needs = plan.development_needs.len(),
            "created development plan"
        );
        Ok(plan)
    }

    pub fn plan(&self, principal: &Principal, plan_id: &str) -> Result<DevelopmentPlan> {
        let plan = self.require_plan(plan_id)?;
        let owner = self.store().get::<User>(&plan.user_id)?;
        self.check(
            principal,
            Action::ViewAssessment {
                subject_id: &plan.user_id,
                supervisor_id: owner.as_ref().and_then(|u| u.supervisor_id.as_deref()),
            },
        )?;
        Ok(plan)
    }

    /// Most recent plan of a user, optionally limited to one cycle.
    pub fn latest_plan(
        &self,
        principal: &Principal,
        user_id: &str,
        cycle_id: Option<&str>,
    ) -> Result<Option<DevelopmentPlan>> {
        let owner = self.store().get::<User>(user_id)?;
        self.check(
            principal,
            Action::ViewAssessment {
                subject_id: user_id,
                supervisor_id: owner.as_ref().and_then(|u| u.supervisor_id.as_deref()),
            },
        )?;
        self.latest_plan_of(user_id, cycle_id)
    }

    fn latest_plan_of(&self, user_id: &str, cycle_id: Option<&str>) -> Result<Option<DevelopmentPlan>> {
        let plans: Vec<DevelopmentPlan> = self.store().query("user_id", user_id)?;
        Ok(plans
            .into_iter()
            .filter(|p| cycle_id.map_or(true, |c| p.cycle_id == c))
            .max_by_key(|p| p.created_at))
    }

    pub fn add_activity(
        &self,
        principal: &Principal,
        plan_id: &str,
        input: NewActivity,
    ) -> Result<DevelopmentPlan> {
        let mut plan = self.require_plan(plan_id)?;
        self.check_plan_owner(principal, &plan)?;

        if matches!(plan.status, PlanStatus::Submitted | PlanStatus::Completed) {
            return Err(ValidationError::InvalidValue {
                field: "status".into(),
                message: format!("activities cannot be added to a {} plan", plan.status.as_str()),
            }
            .into());
        }
        if input.title.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "title".into(),
                message: "must not be empty".into(),
            }
            .into());
        }
        let unknown: Vec<String> = input
            .target_competency_ids
            .iter()
            .filter(|id| !plan.development_needs.iter().any(|n| &n.competency_id == *id))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(ValidationError::UnknownTargets(unknown).into());
        }

        let now = Self::now();
        let activity = DevelopmentActivity {
            id: Uuid::new_v4().to_string(),
            title: input.title.trim().to_string(),
            kind: input.kind,
            description: input.description,
            target_competency_ids: input.target_competency_ids,
            target_date: input.target_date,
            status: ActivityStatus::Planned,
            progress: 0,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        };
        tracing::info!(plan = %plan_id, activity = %activity.id, "added activity");
        plan.activities.push(activity);
        plan.updated_at = now;
        self.store().put(&plan)?;
        Ok(plan)
    }

    /// Update an activity. Completing it sets progress to 100; closed
    /// activities cannot be reopened.
    pub fn update_activity(
        &self,
        principal: &Principal,
        plan_id: &str,
        activity_id: &str,
        update: ActivityUpdate,
    ) -> Result<DevelopmentPlan> {
        let mut plan = self.require_plan(plan_id)?;
        self.check_plan_owner(principal, &plan)?;

        if let Some(progress) = update.progress {
            if progress > 100 {
                return Err(ValidationError::InvalidValue {
                    field: "progress".into(),
                    message: format!("{progress} is outside 0-100"),
                }
                .into());
            }
        }

        let now = Self::now();
        let activity = plan
            .activity_mut(activity_id)
            .ok_or_else(|| CoreError::not_found("activities", activity_id))?;

        if let Some(status) = update.status {
            if activity.status.is_closed() && status != activity.status {
                return Err(ValidationError::InvalidTransition {
                    entity: "activity",
                    from: activity_status_name(activity.status).into(),
                    to: activity_status_name(status).into(),
                }
                .into());
            }
            activity.status = status;
        }
        if let Some(progress) = update.progress {
            activity.progress = progress;
        }
        if activity.status == ActivityStatus::Completed {
            activity.progress = 100;
        }
        if let Some(notes) = update.notes {
            activity.notes = notes;
        }
        activity.updated_at = now;

        if let Some(status) = plan.sync_with_activities() {
            tracing::info!(plan = %plan_id, status = status.as_str(), "plan advanced");
        }
        plan.updated_at = now;
        self.store().put(&plan)?;
        Ok(plan)
    }

    /// Send a draft or rejected plan to the supervisor.
    pub fn submit_plan(&self, principal: &Principal, plan_id: &str) -> Result<DevelopmentPlan> {
        let mut plan = self.require_plan(plan_id)?;
        self.check_plan_owner(principal, &plan)?;
        if plan.activities.is_empty() {
            return Err(ValidationError::EmptyCollection("activities".into()).into());
        }

        plan.transition(PlanStatus::Submitted)?;
        let now = Self::now();
        plan.submitted_at = Some(now);
        plan.updated_at = now;
        self.store().put(&plan)?;
        tracing::info!(plan = %plan_id, "submitted plan for approval");
        Ok(plan)
    }

    pub fn review_plan(
        &self,
        principal: &Principal,
        plan_id: &str,
        approve: bool,
        comments: &str,
    ) -> Result<DevelopmentPlan> {
        let mut plan = self.require_plan(plan_id)?;
        let owner = self.require_user(&plan.user_id)?;
        self.check(
            principal,
            Action::ReviewPlan {
                owner_supervisor_id: owner.supervisor_id.as_deref(),
            },
        )?;

        let to = if approve {
            PlanStatus::Approved
        } else {
            PlanStatus::Rejected
        };
        plan.transition(to)?;

        let now = Self::now();
        plan.approved_by = approve.then(|| principal.user_id.clone());
        plan.supervisor_comments = comments.to_string();
        plan.reviewed_at = Some(now);
        plan.updated_at = now;
        self.store().put(&plan)?;
        tracing::info!(plan = %plan_id, status = to.as_str(), "reviewed plan");
        Ok(plan)
    }

    /// Latest plan of each direct report that has one.
    pub fn subordinate_plans(
        &self,
        principal: &Principal,
        supervisor_id: &str,
    ) -> Result<Vec<(User, DevelopmentPlan)>> {
        self.check(principal, Action::ViewTeam { supervisor_id })?;
        let mut out = Vec::new();
        for report in self.reports_of(supervisor_id)? {
            if let Some(plan) = self.latest_plan_of(&report.id, None)? {
                out.push((report, plan));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::fixtures::{uniform, Fixture, CORE};

    fn course(targets: &[&str]) -> NewActivity {
        NewActivity {
            title: "Negotiation course".into(),
            kind: ActivityKind::Training,
            description: String::new(),
            target_competency_ids: targets.iter().map(|s| s.to_string()).collect(),
            target_date: None,
        }
    }

    /// Ana rates herself 1 on C1/C2 and 3 elsewhere, nobody else rates.
    fn plan(fx: &Fixture) -> DevelopmentPlan {
        let ana = fx.as_user("ana");
        let a = fx.app.start_assessment(&ana, "ana", None).unwrap();
        let mut ratings = uniform(&CORE, 3);
        ratings.extend(uniform(&["C1", "C2"], 1));
        fx.app.submit_self_rating(&ana, &a.id, ratings).unwrap();
        fx.app.create_development_plan(&ana, &a.id).unwrap()
    }

    #[test]
    fn plan_holds_exactly_the_development_needs() {
        let fx = Fixture::new();
        let p = plan(&fx);
        assert_eq!(p.status, PlanStatus::Draft);
        let ids: Vec<&str> = p
            .development_needs
            .iter()
            .map(|n| n.competency_id.as_str())
            .collect();
        assert_eq!(ids, ["C1", "C2"]);
        assert_eq!(p.development_needs[0].target_level, 2);
        assert_eq!(p.development_needs[0].current_level, 1.0);

        let again = fx
            .app
            .create_development_plan(&fx.as_user("ana"), &p.assessment_id)
            .unwrap();
        assert_eq!(again.id, p.id);
    }

    #[test]
    fn activities_target_plan_needs() {
        let fx = Fixture::new();
        let p = plan(&fx);
        let ana = fx.as_user("ana");
        let err = fx
            .app
            .add_activity(&ana, &p.id, course(&["C1", "C5"]))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::UnknownTargets(ref ids)) if ids == &["C5"]
        ));
        assert_eq!(
            err.to_string(),
            "Validation error: Not a development need of this plan: C5"
        );

        let updated = fx.app.add_activity(&ana, &p.id, course(&["C1"])).unwrap();
        assert_eq!(updated.activities.len(), 1);
        assert_eq!(updated.activities[0].status, ActivityStatus::Planned);
    }

    #[test]
    fn submit_needs_an_activity() {
        let fx = Fixture::new();
        let p = plan(&fx);
        let err = fx.app.submit_plan(&fx.as_user("ana"), &p.id).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::EmptyCollection(_))
        ));
    }

    #[test]
    fn review_flow_and_activity_progress() {
        let fx = Fixture::new();
        let p = plan(&fx);
        let ana = fx.as_user("ana");
        let boss = fx.as_user("boss");
        let p = fx.app.add_activity(&ana, &p.id, course(&["C1"])).unwrap();
        let activity_id = p.activities[0].id.clone();

        let p = fx.app.submit_plan(&ana, &p.id).unwrap();
        assert_eq!(p.status, PlanStatus::Submitted);
        assert!(p.submitted_at.is_some());
        assert!(fx.app.add_activity(&ana, &p.id, course(&["C2"])).is_err());

        assert!(matches!(
            fx.app.review_plan(&fx.as_user("p1"), &p.id, true, "").unwrap_err(),
            CoreError::Access(_)
        ));
        let p = fx.app.review_plan(&boss, &p.id, false, "add a mentor").unwrap();
        assert_eq!(p.status, PlanStatus::Rejected);
        assert!(p.approved_by.is_none());

        let p = fx.app.submit_plan(&ana, &p.id).unwrap();
        let p = fx.app.review_plan(&boss, &p.id, true, "ok").unwrap();
        assert_eq!(p.approved_by.as_deref(), Some("boss"));

        let p = fx
            .app
            .update_activity(
                &ana,
                &p.id,
                &activity_id,
                ActivityUpdate {
                    status: Some(ActivityStatus::InProgress),
                    progress: Some(40),
                    notes: None,
                },
            )
            .unwrap();
        assert_eq!(p.status, PlanStatus::InProgress);

        let err = fx
            .app
            .update_activity(
                &ana,
                &p.id,
                &activity_id,
                ActivityUpdate {
                    progress: Some(140),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let p = fx
            .app
            .update_activity(
                &ana,
                &p.id,
                &activity_id,
                ActivityUpdate {
                    status: Some(ActivityStatus::Completed),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(p.activities[0].progress, 100);
        assert_eq!(p.status, PlanStatus::Completed);

        let err = fx
            .app
            .update_activity(
                &ana,
                &p.id,
                &activity_id,
                ActivityUpdate {
                    status: Some(ActivityStatus::Planned),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn supervisors_see_their_reports_plans() {
        let fx = Fixture::new();
        let p = plan(&fx);
        let plans = fx
            .app
            .subordinate_plans(&fx.as_user("boss"), "boss")
            .unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].1.id, p.id);

        let latest = fx
            .app
            .latest_plan(&fx.as_user("boss"), "ana", Some(&fx.cycle.id))
            .unwrap();
        assert_eq!(latest.map(|l| l.id), Some(p.id));
        assert!(fx
            .app
            .latest_plan(&fx.as_user("p1"), "ana", None)
            .is_err());
    }
}
