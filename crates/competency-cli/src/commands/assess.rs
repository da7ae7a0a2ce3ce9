use clap::Subcommand;

use crate::common::{parse_ratings, print_json, CliResult, Session};

#[derive(Subcommand)]
pub enum AssessAction {
    /// Start (or fetch) a user's assessment in a cycle
    Start {
        /// Subject user id; defaults to the caller
        #[arg(long)]
        user: Option<String>,
        /// Cycle id; defaults to the active cycle
        #[arg(long)]
        cycle: Option<String>,
    },
    /// Show an assessment
    Show { id: String },
    /// List a user's assessments
    List { user_id: String },
    /// Ratings stored for an assessment
    Ratings { id: String },
    /// Submit the caller's self rating, e.g. C1=3 C2=2
    SelfRate {
        id: String,
        #[arg(required = true)]
        ratings: Vec<String>,
    },
    /// Replace the peer roster of an assessment
    AssignPeers {
        id: String,
        #[arg(required = true)]
        raters: Vec<String>,
    },
    /// Submit the caller's peer rating
    PeerRate {
        id: String,
        #[arg(required = true)]
        ratings: Vec<String>,
    },
    /// Submit the superior rating
    SuperiorRate {
        id: String,
        #[arg(required = true)]
        ratings: Vec<String>,
    },
    /// Peer ratings a rater still owes
    PendingPeer {
        /// Rater id; defaults to the caller
        rater: Option<String>,
    },
    /// Direct reports waiting for a superior rating
    PendingSuperior {
        /// Supervisor id; defaults to the caller
        supervisor: Option<String>,
    },
    /// Peer rosters of every user in a cycle
    Peers {
        #[arg(long)]
        cycle: Option<String>,
    },
}

pub fn run(as_user: &str, action: AssessAction) -> CliResult {
    let Session { app, principal } = Session::open(as_user)?;
    let me = principal.user_id.clone();
    match action {
        AssessAction::Start { user, cycle } => {
            let subject = user.unwrap_or(me);
            print_json(&app.start_assessment(&principal, &subject, cycle.as_deref())?)?;
        }
        AssessAction::Show { id } => match app.assessment(&principal, &id)? {
            Some(a) => print_json(&a)?,
            None => return Err(format!("assessment '{id}' not found").into()),
        },
        AssessAction::List { user_id } => {
            print_json(&app.assessments_for_user(&principal, &user_id)?)?
        }
        AssessAction::Ratings { id } => {
            app.assessment(&principal, &id)?
                .ok_or_else(|| format!("assessment '{id}' not found"))?;
            print_json(&app.ratings_for(&id)?)?;
        }
        AssessAction::SelfRate { id, ratings } => {
            let ratings = parse_ratings(&ratings)?;
            print_json(&app.submit_self_rating(&principal, &id, ratings)?)?;
        }
        AssessAction::AssignPeers { id, raters } => {
            print_json(&app.assign_peer_raters(&principal, &id, raters)?)?
        }
        AssessAction::PeerRate { id, ratings } => {
            let ratings = parse_ratings(&ratings)?;
            print_json(&app.submit_peer_rating(&principal, &id, ratings)?)?;
        }
        AssessAction::SuperiorRate { id, ratings } => {
            let ratings = parse_ratings(&ratings)?;
            print_json(&app.submit_superior_rating(&principal, &id, ratings)?)?;
        }
        AssessAction::PendingPeer { rater } => {
            let rater = rater.unwrap_or(me);
            print_json(&app.pending_peer_requests(&principal, &rater)?)?;
        }
        AssessAction::PendingSuperior { supervisor } => {
            let supervisor = supervisor.unwrap_or(me);
            print_json(&app.pending_superior_ratings(&principal, &supervisor)?)?;
        }
        AssessAction::Peers { cycle } => {
            print_json(&app.peer_assignment_overview(&principal, cycle.as_deref())?)?
        }
    }
    Ok(())
}
