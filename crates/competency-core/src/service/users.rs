use serde::{Deserialize, Serialize};

use super::App;
use crate::access::{Action, Principal};
use crate::error::{CoreError, Result, ValidationError};
use crate::model::{is_supervisor_position, Position, User, UserRole};
use crate::storage::{DocumentStore, DocumentStoreExt};

/// Editable part of a user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub position_id: String,
    pub department_id: String,
    #[serde(default)]
    pub supervisor_id: Option<String>,
}

impl UserProfile {
    fn validate(&self, user_id: &str) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "name".into(),
                message: "must not be empty".into(),
            });
        }
        if !self.email.contains('@') {
            return Err(ValidationError::InvalidValue {
                field: "email".into(),
                message: format!("'{}' is not an email address", self.email),
            });
        }
        if self.supervisor_id.as_deref() == Some(user_id) {
            return Err(ValidationError::InvalidValue {
                field: "supervisor_id".into(),
                message: "a user cannot supervise themself".into(),
            });
        }
        Ok(())
    }
}

impl<S: DocumentStore> App<S> {
    /// Create or update a profile. Supervisor status follows the position.
    ///
    /// Users fill in their own placement when the profile is created; later
    /// changes to position, department or supervisor are HR/Admin only.
    pub fn save_user_profile(
        &self,
        principal: &Principal,
        user_id: &str,
        profile: UserProfile,
    ) -> Result<User> {
        self.check(principal, Action::EditProfile { user_id })?;
        profile.validate(user_id)?;

        self.store()
            .get::<Position>(&profile.position_id)?
            .ok_or_else(|| CoreError::not_found("positions", &profile.position_id))?;
        if self.department(&profile.department_id)?.is_none() {
            return Err(CoreError::not_found("departments", &profile.department_id));
        }
        if let Some(supervisor_id) = &profile.supervisor_id {
            self.require_user(supervisor_id)?;
        }

        let existing = self.store().get::<User>(user_id)?;
        if let Some(current) = &existing {
            let moved = current.position_id != profile.position_id
                || current.department_id != profile.department_id
                || current.supervisor_id != profile.supervisor_id;
            if moved {
                self.check(principal, Action::ChangePlacement)?;
            }
        }

        let now = Self::now();
        let user = User {
            id: user_id.to_string(),
            is_supervisor: is_supervisor_position(&profile.position_id),
            name: profile.name.trim().to_string(),
            email: profile.email,
            position_id: profile.position_id,
            department_id: profile.department_id,
            supervisor_id: profile.supervisor_id,
            role: existing.as_ref().map(|u| u.role).unwrap_or_default(),
            created_at: existing.as_ref().map(|u| u.created_at).unwrap_or(now),
            updated_at: now,
        };
        self.store().put(&user)?;

        if existing.is_some() {
            tracing::info!(user = %user_id, "updated profile");
        } else {
            tracing::info!(user = %user_id, "created profile");
        }
        Ok(user)
    }

    pub fn get_user(&self, principal: &Principal, user_id: &str) -> Result<Option<User>> {
        self.check(principal, Action::ViewUser { user_id })?;
        self.store().get(user_id)
    }

    pub fn users(&self, principal: &Principal) -> Result<Vec<User>> {
        self.check(principal, Action::ManageUsers)?;
        self.all_users()
    }

    pub(crate) fn all_users(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.store().list()?;
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    pub fn users_by_department(&self, principal: &Principal, department_id: &str) -> Result<Vec<User>> {
        self.check(principal, Action::ManageUsers)?;
        let mut users: Vec<User> = self.store().query("department_id", department_id)?;
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    pub fn direct_reports(&self, principal: &Principal, supervisor_id: &str) -> Result<Vec<User>> {
        self.check(principal, Action::ViewTeam { supervisor_id })?;
        self.reports_of(supervisor_id)
    }

    pub(crate) fn reports_of(&self, supervisor_id: &str) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.store().query("supervisor_id", supervisor_id)?;
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    pub fn set_role(&self, principal: &Principal, user_id: &str, role: UserRole) -> Result<User> {
        self.check(principal, Action::ManageUsers)?;
        let mut user = self.require_user(user_id)?;
        if user.role != role {
            user.role = role;
            user.updated_at = Self::now();
            self.store().put(&user)?;
            tracing::info!(user = %user_id, role = ?role, "changed role");
        }
        Ok(user)
    }

    pub fn promote_to_hr(&self, principal: &Principal, user_id: &str) -> Result<User> {
        self.set_role(principal, user_id, UserRole::Hr)
    }
}
