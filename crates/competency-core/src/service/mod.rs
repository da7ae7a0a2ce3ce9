//! Application services.
//!
//! [`App`] owns the document store and the loaded [`Config`]. Every public
//! operation takes the calling [`Principal`], checks it with
//! [`authorize`](crate::access::authorize), validates its input and only then
//! writes.

mod assessments;
mod catalog;
mod cycles;
mod gap;
mod plans;
mod users;

#[cfg(test)]
pub(crate) mod fixtures;

pub use assessments::{PeerAssignmentRow, PeerRequest, SuperiorRequest};
pub use catalog::OrgGroupScope;
pub use cycles::NewCycle;
pub use gap::GapAnalysis;
pub use plans::{ActivityUpdate, NewActivity};
pub use users::UserProfile;

use chrono::{DateTime, Utc};

use crate::access::{authorize, Action, Principal};
use crate::error::{CoreError, Result};
use crate::model::User;
use crate::storage::{Config, Database, DocumentStore, DocumentStoreExt};

/// Application state passed to every operation.
pub struct App<S: DocumentStore> {
    store: S,
    config: Config,
}

impl App<Database> {
    /// Open the configured on-disk database.
    pub fn open(config: Config) -> Result<Self> {
        let db = Database::open(&config)?;
        Ok(Self::new(db, config))
    }
}

impl<S: DocumentStore> App<S> {
    pub fn new(store: S, config: Config) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve a caller id into a principal with its effective role.
    ///
    /// [`Principal::SYSTEM_ID`] resolves without a stored user.
    pub fn principal(&self, user_id: &str) -> Result<Principal> {
        if user_id == Principal::SYSTEM_ID {
            return Ok(Principal::system());
        }
        let user = self.require_user(user_id)?;
        Ok(Principal::from_user(&user))
    }

    pub(crate) fn now() -> DateTime<Utc> {
        Utc::now()
    }

    pub(crate) fn check(&self, principal: &Principal, action: Action<'_>) -> Result<()> {
        authorize(principal, &action).map_err(|e| {
            tracing::warn!(user = %principal.user_id, "{e}");
            CoreError::from(e)
        })
    }

    pub(crate) fn require_user(&self, user_id: &str) -> Result<User> {
        self.store
            .get::<User>(user_id)?
            .ok_or_else(|| CoreError::not_found("users", user_id))
    }
}
