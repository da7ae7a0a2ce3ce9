use clap::Subcommand;
use competency_core::service::UserProfile;
use competency_core::UserRole;

use crate::common::{print_json, CliResult, Session};

#[derive(Subcommand)]
pub enum UserAction {
    /// Create or update a user profile
    Save {
        /// User id
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        position: String,
        #[arg(long)]
        department: String,
        /// Supervisor user id
        #[arg(long)]
        supervisor: Option<String>,
    },
    /// Show a user
    Show { id: String },
    /// List users, optionally for one department
    List {
        #[arg(long)]
        department: Option<String>,
    },
    /// Direct reports of a supervisor
    Reports { supervisor_id: String },
    /// Change a user's role (employee, hr, admin)
    SetRole { id: String, role: UserRole },
}

pub fn run(as_user: &str, action: UserAction) -> CliResult {
    let Session { app, principal } = Session::open(as_user)?;
    match action {
        UserAction::Save {
            id,
            name,
            email,
            position,
            department,
            supervisor,
        } => {
            let profile = UserProfile {
                name,
                email,
                position_id: position,
                department_id: department,
                supervisor_id: supervisor,
            };
            print_json(&app.save_user_profile(&principal, &id, profile)?)?;
        }
        UserAction::Show { id } => match app.get_user(&principal, &id)? {
            Some(user) => print_json(&user)?,
            None => return Err(format!("user '{id}' not found").into()),
        },
        UserAction::List { department } => {
            let users = match department {
                Some(d) => app.users_by_department(&principal, &d)?,
                None => app.users(&principal)?,
            };
            print_json(&users)?;
        }
        UserAction::Reports { supervisor_id } => {
            print_json(&app.direct_reports(&principal, &supervisor_id)?)?
        }
        UserAction::SetRole { id, role } => print_json(&app.set_role(&principal, &id, role)?)?,
    }
    Ok(())
}
