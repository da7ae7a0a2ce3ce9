//! Role-based access control.
//!
//! Every operation names an [`Action`]; [`authorize`] decides it with an
//! exhaustive match over [`Role`], so adding a role or an action forces a
//! decision here.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AccessError;
use crate::model::{User, UserRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Employee,
    Supervisor,
    Hr,
    Admin,
}

impl Role {
    /// Effective role of a stored user; supervisory employees become `Supervisor`.
    pub fn of(user: &User) -> Self {
        match user.role {
            UserRole::Admin => Role::Admin,
            UserRole::Hr => Role::Hr,
            UserRole::Employee if user.is_supervisor => Role::Supervisor,
            UserRole::Employee => Role::Employee,
        }
    }

    pub fn is_hr_or_admin(self) -> bool {
        matches!(self, Role::Hr | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Employee => "employee",
            Role::Supervisor => "supervisor",
            Role::Hr => "hr",
            Role::Admin => "admin",
        })
    }
}

/// The authenticated caller of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: String,
    pub role: Role,
}

impl Principal {
    pub const SYSTEM_ID: &'static str = "system";

    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn from_user(user: &User) -> Self {
        Self::new(user.id.clone(), Role::of(user))
    }

    /// Local operator with administrative rights, used for bootstrap tasks.
    pub fn system() -> Self {
        Self::new(Self::SYSTEM_ID, Role::Admin)
    }

    pub fn is(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    fn is_opt(&self, user_id: Option<&str>) -> bool {
        user_id == Some(self.user_id.as_str())
    }
}

/// An operation subject to authorization, with the ownership facts it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    SeedCatalog,
    ClearCatalog,
    EditDepartment,
    ManageUsers,
    ViewUser { user_id: &'a str },
    EditProfile { user_id: &'a str },
    /// Position, department or supervisor of an existing profile.
    ChangePlacement,
    ManageCycles,
    StartAssessment { subject_id: &'a str },
    ViewAssessment { subject_id: &'a str, supervisor_id: Option<&'a str> },
    SubmitSelfRating { subject_id: &'a str },
    AssignPeers,
    SubmitPeerRating,
    SubmitSuperiorRating {
        subject_id: &'a str,
        supervisor_id: Option<&'a str>,
    },
    ViewGapAnalysis { subject_id: &'a str, supervisor_id: Option<&'a str> },
    ManagePlan { owner_id: &'a str },
    ReviewPlan { owner_supervisor_id: Option<&'a str> },
    ViewTeam { supervisor_id: &'a str },
    ViewReports,
}

impl Action<'_> {
    pub fn describe(&self) -> &'static str {
        match self {
            Action::SeedCatalog => "seed the catalog",
            Action::ClearCatalog => "clear the database",
            Action::EditDepartment => "edit departments",
            Action::ManageUsers => "manage users",
            Action::ViewUser { .. } => "view this user",
            Action::EditProfile { .. } => "edit this profile",
            Action::ChangePlacement => "change position, department or supervisor",
            Action::ManageCycles => "manage assessment cycles",
            Action::StartAssessment { .. } => "start this assessment",
            Action::ViewAssessment { .. } => "view this assessment",
            Action::SubmitSelfRating { .. } => "submit a self rating for another user",
            Action::AssignPeers => "assign peer raters",
            Action::SubmitPeerRating => "submit peer ratings",
            Action::SubmitSuperiorRating { .. } => "submit a superior rating for this user",
            Action::ViewGapAnalysis { .. } => "view this gap analysis",
            Action::ManagePlan { .. } => "manage this development plan",
            Action::ReviewPlan { .. } => "review this development plan",
            Action::ViewTeam { .. } => "view this team",
            Action::ViewReports => "view reports",
        }
    }
}

pub fn authorize(principal: &Principal, action: &Action<'_>) -> Result<(), AccessError> {
    let role = principal.role;
    let allowed = match action {
        // Roster membership is checked against the assessment itself.
        Action::SubmitPeerRating => true,

        Action::ClearCatalog => role == Role::Admin,

        Action::SeedCatalog
        | Action::EditDepartment
        | Action::ManageUsers
        | Action::ChangePlacement
        | Action::ManageCycles
        | Action::AssignPeers
        | Action::ViewReports => role.is_hr_or_admin(),

        Action::ViewUser { user_id }
        | Action::EditProfile { user_id }
        | Action::StartAssessment { subject_id: user_id } => {
            principal.is(user_id) || role.is_hr_or_admin()
        }

        // Self ratings are only ever the subject's own.
        Action::SubmitSelfRating { subject_id } => principal.is(subject_id),

        Action::ViewAssessment {
            subject_id,
            supervisor_id,
        }
        | Action::ViewGapAnalysis {
            subject_id,
            supervisor_id,
        } => match role {
            Role::Hr | Role::Admin => true,
            Role::Supervisor => principal.is(subject_id) || principal.is_opt(*supervisor_id),
            Role::Employee => principal.is(subject_id),
        },

        // Nobody rates themself as a superior, whatever their role.
        Action::SubmitSuperiorRating {
            subject_id,
            supervisor_id,
        } => {
            !principal.is(subject_id) && (role.is_hr_or_admin() || principal.is_opt(*supervisor_id))
        }

        Action::ManagePlan { owner_id } => principal.is(owner_id) || role.is_hr_or_admin(),

        Action::ReviewPlan {
            owner_supervisor_id,
        } => match role {
            Role::Hr | Role::Admin => true,
            Role::Supervisor | Role::Employee => principal.is_opt(*owner_supervisor_id),
        },

        Action::ViewTeam { supervisor_id } => match role {
            Role::Hr | Role::Admin => true,
            Role::Supervisor => principal.is(supervisor_id),
            Role::Employee => false,
        },
    };

    if allowed {
        Ok(())
    } else {
        Err(AccessError::Forbidden {
            role,
            action: action.describe().to_string(),
        })
    }
}
