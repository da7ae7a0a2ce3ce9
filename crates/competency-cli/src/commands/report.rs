use clap::Subcommand;

use crate::common::{print_json, CliResult, Session};

#[derive(Subcommand)]
pub enum ReportAction {
    /// Gap report for one assessment
    Individual { assessment_id: String },
    /// Status and gap summary of a department
    Department {
        department_id: String,
        /// Cycle id; defaults to the active cycle
        #[arg(long)]
        cycle: Option<String>,
    },
    /// Completion counts per department
    Completion {
        #[arg(long)]
        cycle: Option<String>,
    },
}

pub fn run(as_user: &str, action: ReportAction) -> CliResult {
    let Session { app, principal } = Session::open(as_user)?;
    match action {
        ReportAction::Individual { assessment_id } => {
            print_json(&app.individual_report(&principal, &assessment_id)?)
        }
        ReportAction::Department {
            department_id,
            cycle,
        } => print_json(&app.department_report(&principal, &department_id, cycle.as_deref())?),
        ReportAction::Completion { cycle } => {
            print_json(&app.completion_report(&principal, cycle.as_deref())?)
        }
    }
}
