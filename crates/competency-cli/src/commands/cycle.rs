use chrono::NaiveDate;
use clap::Subcommand;
use competency_core::model::CompetencyType;
use competency_core::service::NewCycle;
use competency_core::RaterWeights;

use crate::common::{print_json, CliResult, Session};

#[derive(Subcommand)]
pub enum CycleAction {
    /// Create an upcoming cycle
    Create {
        name: String,
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Last day (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,
        /// Competency types to assess; repeat or comma-separate
        #[arg(long = "type", value_delimiter = ',', required = true)]
        types: Vec<CompetencyType>,
        #[arg(long, default_value = "")]
        description: String,
        /// Self, peer and superior weights, e.g. 0.2,0.3,0.5
        #[arg(long, value_delimiter = ',', num_args = 3)]
        weights: Option<Vec<f64>>,
    },
    /// List cycles, newest first
    List,
    /// Show the active cycle
    Active,
    /// Activate a cycle; the previous active cycle is completed
    Activate { id: String },
    /// Close a cycle
    Close { id: String },
}

pub fn run(as_user: &str, action: CycleAction) -> CliResult {
    let Session { app, principal } = Session::open(as_user)?;
    match action {
        CycleAction::Create {
            name,
            start,
            end,
            types,
            description,
            weights,
        } => {
            let weights = match weights.as_deref() {
                Some(&[s, p, sup]) => Some(RaterWeights::new(s, p, sup)?),
                Some(_) => return Err("--weights takes exactly three values".into()),
                None => None,
            };
            let cycle = app.create_cycle(
                &principal,
                NewCycle {
                    name,
                    description,
                    start_date: start,
                    end_date: end,
                    competency_types: types,
                    weights,
                },
            )?;
            print_json(&cycle)?;
        }
        CycleAction::List => print_json(&app.cycles()?)?,
        CycleAction::Active => print_json(&app.active_cycle()?)?,
        CycleAction::Activate { id } => print_json(&app.activate_cycle(&principal, &id)?)?,
        CycleAction::Close { id } => print_json(&app.close_cycle(&principal, &id)?)?,
    }
    Ok(())
}
