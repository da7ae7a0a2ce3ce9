use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::App;
use crate::access::{Action, Principal};
use crate::error::{CoreError, Result, ValidationError};
use crate::model::{AssessmentCycle, CompetencyType, CycleStatus};
use crate::scoring::RaterWeights;
use crate::storage::{DocumentStore, DocumentStoreExt, WriteBatch};

/// Input for [`App::create_cycle`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCycle {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub competency_types: Vec<CompetencyType>,
    /// Defaults to `scoring.default_weights` from the config.
    #[serde(default)]
    pub weights: Option<RaterWeights>,
}

fn status_name(status: CycleStatus) -> &'static str {
    match status {
        CycleStatus::Upcoming => "upcoming",
        CycleStatus::Active => "active",
        CycleStatus::Completed => "completed",
    }
}

fn invalid_transition(cycle: &AssessmentCycle, to: CycleStatus) -> ValidationError {
    ValidationError::InvalidTransition {
        entity: "assessment cycle",
        from: status_name(cycle.status).into(),
        to: status_name(to).into(),
    }
}

impl<S: DocumentStore> App<S> {
    pub fn create_cycle(&self, principal: &Principal, input: NewCycle) -> Result<AssessmentCycle> {
        self.check(principal, Action::ManageCycles)?;

        if input.name.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "name".into(),
                message: "must not be empty".into(),
            }
            .into());
        }
        if input.start_date >= input.end_date {
            return Err(ValidationError::InvalidDateRange {
                start: input.start_date,
                end: input.end_date,
            }
            .into());
        }
        let mut competency_types = input.competency_types;
        competency_types.sort();
        competency_types.dedup();
        if competency_types.is_empty() {
            return Err(ValidationError::EmptyCollection("competency_types".into()).into());
        }
        let weights = input
            .weights
            .unwrap_or(self.config().scoring.default_weights);
        weights.validate()?;

        let now = Self::now();
        let cycle = AssessmentCycle {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            description: input.description,
            start_date: input.start_date,
            end_date: input.end_date,
            status: CycleStatus::Upcoming,
            competency_types,
            weights,
            created_by: principal.user_id.clone(),
            created_at: now,
            updated_at: now,
        };
        self.store().put(&cycle)?;
        tracing::info!(cycle = %cycle.id, name = %cycle.name, "created cycle");
        Ok(cycle)
    }

    /// All cycles, most recent start first.
    pub fn cycles(&self) -> Result<Vec<AssessmentCycle>> {
        let mut cycles: Vec<AssessmentCycle> = self.store().list()?;
        cycles.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(cycles)
    }

    pub fn cycle(&self, cycle_id: &str) -> Result<Option<AssessmentCycle>> {
        self.store().get(cycle_id)
    }

    pub(crate) fn require_cycle(&self, cycle_id: &str) -> Result<AssessmentCycle> {
        self.cycle(cycle_id)?
            .ok_or_else(|| CoreError::not_found("assessment_cycles", cycle_id))
    }

    pub fn active_cycle(&self) -> Result<Option<AssessmentCycle>> {
        let mut active: Vec<AssessmentCycle> = self.store().query("status", "active")?;
        if active.len() > 1 {
            tracing::warn!(count = active.len(), "more than one active cycle");
        }
        active.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(active.into_iter().next())
    }

    /// Activate an upcoming cycle; any other active cycle is completed in the same write.
    pub fn activate_cycle(&self, principal: &Principal, cycle_id: &str) -> Result<AssessmentCycle> {
        self.check(principal, Action::ManageCycles)?;
        let mut cycle = self.require_cycle(cycle_id)?;
        match cycle.status {
            CycleStatus::Active => return Ok(cycle),
            CycleStatus::Upcoming => {}
            CycleStatus::Completed => {
                return Err(invalid_transition(&cycle, CycleStatus::Active).into());
            }
        }

        let now = Self::now();
        let mut batch = WriteBatch::new();
        let previous: Vec<AssessmentCycle> = self.store().query("status", "active")?;
        for mut other in previous {
            tracing::info!(cycle = %other.id, "completing previously active cycle");
            other.status = CycleStatus::Completed;
            other.updated_at = now;
            batch.put(&other)?;
        }

        cycle.status = CycleStatus::Active;
        cycle.updated_at = now;
        batch.put(&cycle)?;
        self.store().commit(batch)?;
        tracing::info!(cycle = %cycle.id, "activated cycle");
        Ok(cycle)
    }

    pub fn close_cycle(&self, principal: &Principal, cycle_id: &str) -> Result<AssessmentCycle> {
        self.check(principal, Action::ManageCycles)?;
        let mut cycle = self.require_cycle(cycle_id)?;
        if cycle.status == CycleStatus::Completed {
            return Err(invalid_transition(&cycle, CycleStatus::Completed).into());
        }
        cycle.status = CycleStatus::Completed;
        cycle.updated_at = Self::now();
        self.store().put(&cycle)?;
        tracing::info!(cycle = %cycle.id, "closed cycle");
        Ok(cycle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Role;
    use crate::storage::{Config, Database};

    fn app() -> App<Database> {
        App::new(Database::open_memory().unwrap(), Config::default())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_cycle(name: &str) -> NewCycle {
        NewCycle {
            name: name.into(),
            description: String::new(),
            start_date: date(2026, 1, 1),
            end_date: date(2026, 3, 31),
            competency_types: vec![CompetencyType::Core, CompetencyType::Core],
            weights: None,
        }
    }

    #[test]
    fn create_uses_config_weights_and_dedups_types() {
        let app = app();
        let cycle = app.create_cycle(&Principal::system(), new_cycle("Q1")).unwrap();
        assert_eq!(cycle.status, CycleStatus::Upcoming);
        assert_eq!(cycle.competency_types, vec![CompetencyType::Core]);
        assert_eq!(cycle.weights, RaterWeights::default());
        assert_eq!(cycle.created_by, "system");
    }

    #[test]
    fn create_validates_input() {
        let app = app();
        let sys = Principal::system();

        let mut reversed = new_cycle("Q1");
        reversed.end_date = date(2025, 12, 1);
        assert!(matches!(
            app.create_cycle(&sys, reversed).unwrap_err(),
            CoreError::Validation(ValidationError::InvalidDateRange { .. })
        ));

        let mut empty = new_cycle("Q1");
        empty.competency_types.clear();
        assert!(matches!(
            app.create_cycle(&sys, empty).unwrap_err(),
            CoreError::Validation(ValidationError::EmptyCollection(_))
        ));

        let mut zero = new_cycle("Q1");
        zero.weights = Some(RaterWeights {
            self_weight: 0.0,
            peer: 0.0,
            superior: 0.0,
        });
        assert!(matches!(
            app.create_cycle(&sys, zero).unwrap_err(),
            CoreError::Validation(ValidationError::InvalidWeights(_))
        ));

        let employee = Principal::new("e", Role::Employee);
        assert!(matches!(
            app.create_cycle(&employee, new_cycle("Q1")).unwrap_err(),
            CoreError::Access(_)
        ));
    }

    #[test]
    fn activation_leaves_exactly_one_active_cycle() {
        let app = app();
        let sys = Principal::system();
        let q1 = app.create_cycle(&sys, new_cycle("Q1")).unwrap();
        let q2 = app.create_cycle(&sys, new_cycle("Q2")).unwrap();

        app.activate_cycle(&sys, &q1.id).unwrap();
        app.activate_cycle(&sys, &q2.id).unwrap();

        let active: Vec<_> = app
            .cycles()
            .unwrap()
            .into_iter()
            .filter(|c| c.is_active())
            .collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, q2.id);
        assert_eq!(app.cycle(&q1.id).unwrap().unwrap().status, CycleStatus::Completed);
        assert_eq!(app.active_cycle().unwrap().unwrap().id, q2.id);
    }

    #[test]
    fn completed_cycles_stay_closed() {
        let app = app();
        let sys = Principal::system();
        let q1 = app.create_cycle(&sys, new_cycle("Q1")).unwrap();
        app.close_cycle(&sys, &q1.id).unwrap();
        assert!(app.activate_cycle(&sys, &q1.id).is_err());
        assert!(app.close_cycle(&sys, &q1.id).is_err());
        assert!(app.active_cycle().unwrap().is_none());
    }
}
