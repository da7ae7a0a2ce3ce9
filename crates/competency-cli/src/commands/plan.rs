use chrono::NaiveDate;
use clap::Subcommand;
use competency_core::model::{ActivityKind, ActivityStatus};
use competency_core::service::{ActivityUpdate, NewActivity};

use crate::common::{print_json, CliResult, Session};

#[derive(Subcommand)]
pub enum PlanAction {
    /// Draft a plan from an assessment's development needs
    Create { assessment_id: String },
    /// Show a plan
    Show { id: String },
    /// Latest plan of a user
    Latest {
        /// User id; defaults to the caller
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        cycle: Option<String>,
    },
    /// Add an activity to a plan
    AddActivity {
        plan_id: String,
        title: String,
        /// training, mentoring, job-rotation, self-study, coaching, special-project
        #[arg(long)]
        kind: ActivityKind,
        #[arg(long, default_value = "")]
        description: String,
        /// Targeted competency ids; repeat or comma-separate
        #[arg(long = "target", value_delimiter = ',')]
        targets: Vec<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
    },
    /// Update an activity's status, progress or notes
    UpdateActivity {
        plan_id: String,
        activity_id: String,
        /// planned, in-progress, completed, cancelled
        #[arg(long)]
        status: Option<ActivityStatus>,
        /// 0-100
        #[arg(long)]
        progress: Option<u8>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Submit a plan for approval
    Submit { id: String },
    /// Approve or reject a submitted plan
    Review {
        id: String,
        /// Reject instead of approve
        #[arg(long)]
        reject: bool,
        #[arg(long, default_value = "")]
        comments: String,
    },
    /// Latest plans of a supervisor's direct reports
    Team {
        /// Supervisor id; defaults to the caller
        supervisor: Option<String>,
    },
}

pub fn run(as_user: &str, action: PlanAction) -> CliResult {
    let Session { app, principal } = Session::open(as_user)?;
    let me = principal.user_id.clone();
    match action {
        PlanAction::Create { assessment_id } => {
            print_json(&app.create_development_plan(&principal, &assessment_id)?)?
        }
        PlanAction::Show { id } => print_json(&app.plan(&principal, &id)?)?,
        PlanAction::Latest { user, cycle } => {
            let user = user.unwrap_or(me);
            print_json(&app.latest_plan(&principal, &user, cycle.as_deref())?)?;
        }
        PlanAction::AddActivity {
            plan_id,
            title,
            kind,
            description,
            targets,
            due,
        } => {
            let input = NewActivity {
                title,
                kind,
                description,
                target_competency_ids: targets,
                target_date: due,
            };
            print_json(&app.add_activity(&principal, &plan_id, input)?)?;
        }
        PlanAction::UpdateActivity {
            plan_id,
            activity_id,
            status,
            progress,
            notes,
        } => {
            let update = ActivityUpdate {
                status,
                progress,
                notes,
            };
            print_json(&app.update_activity(&principal, &plan_id, &activity_id, update)?)?;
        }
        PlanAction::Submit { id } => print_json(&app.submit_plan(&principal, &id)?)?,
        PlanAction::Review {
            id,
            reject,
            comments,
        } => print_json(&app.review_plan(&principal, &id, !reject, &comments)?)?,
        PlanAction::Team { supervisor } => {
            let supervisor = supervisor.unwrap_or(me);
            print_json(&app.subordinate_plans(&principal, &supervisor)?)?;
        }
    }
    Ok(())
}
