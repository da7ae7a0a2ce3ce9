//! Helpers shared by the command modules.

use competency_core::model::RatingMap;
use competency_core::{App, Config, Database, Level, Principal, ValidationError};
use serde::Serialize;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// An opened app together with the caller it acts for.
pub struct Session {
    pub app: App<Database>,
    pub principal: Principal,
}

impl Session {
    pub fn open(as_user: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        let app = App::open(config)?;
        let principal = app.principal(as_user)?;
        tracing::debug!(user = %principal.user_id, role = %principal.role, "opened session");
        Ok(Self { app, principal })
    }
}

/// Pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse `C1=3 L2=4` style pairs into a rating map.
pub fn parse_ratings(pairs: &[String]) -> Result<RatingMap, ValidationError> {
    let mut ratings = RatingMap::new();
    for pair in pairs {
        let (id, level) = pair.split_once('=').ok_or_else(|| ValidationError::InvalidValue {
            field: "rating".into(),
            message: format!("expected COMPETENCY=LEVEL, got '{pair}'"),
        })?;
        let level: i64 = level.trim().parse().map_err(|_| ValidationError::InvalidValue {
            field: id.trim().to_string(),
            message: format!("'{level}' is not a number"),
        })?;
        ratings.insert(id.trim().to_string(), Level::new(level)?);
    }
    Ok(ratings)
}
