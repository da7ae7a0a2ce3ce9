use clap::Args;

use crate::common::{print_json, CliResult, Session};

#[derive(Args)]
pub struct GapArgs {
    /// Assessment id
    assessment_id: String,
    /// Compare against this position instead of the subject's own
    #[arg(long)]
    position: Option<String>,
    /// Print only the development needs
    #[arg(long)]
    needs_only: bool,
}

pub fn run(as_user: &str, args: GapArgs) -> CliResult {
    let Session { app, principal } = Session::open(as_user)?;
    let mut analysis = app.gap_analysis(&principal, &args.assessment_id, args.position.as_deref())?;
    if args.needs_only {
        analysis.results.retain(|r| !r.is_met());
    }
    print_json(&analysis)
}
