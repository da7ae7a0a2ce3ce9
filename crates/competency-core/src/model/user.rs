use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role stored on a user profile. Supervisor status is derived separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Employee,
    Hr,
    Admin,
}

impl std::str::FromStr for UserRole {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "employee" => Ok(UserRole::Employee),
            "hr" => Ok(UserRole::Hr),
            "admin" => Ok(UserRole::Admin),
            other => Err(crate::error::ValidationError::InvalidValue {
                field: "role".into(),
                message: format!("unknown role '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub position_id: String,
    pub department_id: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub is_supervisor: bool,
    #[serde(default)]
    pub supervisor_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn reports_to(&self, supervisor_id: &str) -> bool {
        self.supervisor_id.as_deref() == Some(supervisor_id)
    }
}

const SUPERVISOR_KEYWORDS: &[&str] = &[
    "president",
    "svp",
    "manager",
    "chief",
    "head",
    "director",
    "attorney-v",
    "internal-auditor-v",
];

/// Whether a position id denotes a supervisory post.
pub fn is_supervisor_position(position_id: &str) -> bool {
    let id = position_id.to_lowercase();
    SUPERVISOR_KEYWORDS.iter().any(|k| id.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supervisor_keywords() {
        assert!(is_supervisor_position("president"));
        assert!(is_supervisor_position("SVP-CIMSG"));
        assert!(is_supervisor_position("attorney-v"));
        assert!(!is_supervisor_position("financial-analyst-iv"));
    }

    #[test]
    fn role_roundtrips_as_snake_case() {
        assert_eq!(serde_json::to_string(&UserRole::Hr).unwrap(), "\"hr\"");
        assert_eq!("ADMIN".parse::<UserRole>().unwrap(), UserRole::Admin);
    }
}
