//! Seeded in-memory app shared by the service tests.
//!
//! Legal Unit (2-3 peers): `boss` (Attorney V, required level 3) supervises
//! `ana` (Legal Assistant III, required level 2) and the peers `p1`..`p4`.
//! `hr` has the HR role. One Core-only cycle is active.

use chrono::NaiveDate;

use super::{App, NewCycle, UserProfile};
use crate::access::{Principal, Role};
use crate::model::{AssessmentCycle, CompetencyType, Level, RatingMap, UserRole};
use crate::storage::{Config, Database};

pub const CORE: [&str; 5] = ["C1", "C2", "C3", "C4", "C5"];

pub struct Fixture {
    pub app: App<Database>,
    pub cycle: AssessmentCycle,
}

impl Fixture {
    pub fn new() -> Self {
        let app = App::new(Database::open_memory().unwrap(), Config::default());
        let sys = Principal::system();
        app.seed_catalog(&sys).unwrap();

        let user = |id: &str, position: &str, supervisor: Option<&str>| {
            app.save_user_profile(
                &sys,
                id,
                UserProfile {
                    name: id.to_uppercase(),
                    email: format!("{id}@example.com"),
                    position_id: position.into(),
                    department_id: "legal-unit".into(),
                    supervisor_id: supervisor.map(str::to_string),
                },
            )
            .unwrap();
        };
        user("boss", "attorney-v", None);
        user("hr", "legal-assistant-iii-1", Some("boss"));
        user("ana", "legal-assistant-iii-1", Some("boss"));
        for peer in ["p1", "p2", "p3", "p4"] {
            user(peer, "legal-assistant-iii-1", Some("boss"));
        }
        app.set_role(&sys, "hr", UserRole::Hr).unwrap();

        let cycle = app
            .create_cycle(
                &sys,
                NewCycle {
                    name: "2026 Annual".into(),
                    description: String::new(),
                    start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                    end_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
                    competency_types: vec![CompetencyType::Core],
                    weights: None,
                },
            )
            .unwrap();
        let cycle = app.activate_cycle(&sys, &cycle.id).unwrap();

        Self { app, cycle }
    }

    pub fn as_user(&self, id: &str) -> Principal {
        self.app.principal(id).unwrap()
    }

    pub fn hr(&self) -> Principal {
        Principal::new("hr", Role::Hr)
    }
}

/// The same level for every listed competency.
pub fn uniform(ids: &[&str], level: i64) -> RatingMap {
    ids.iter()
        .map(|id| (id.to_string(), Level::new(level).unwrap()))
        .collect()
}
