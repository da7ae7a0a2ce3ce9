//! Organisational reference data: positions, departments and org-unit mappings.

use serde::{Deserialize, Serialize};

use super::Level;
use crate::error::ValidationError;

/// A position profile with the level required for each of its competencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: String,
    pub title: String,
    pub department_id: String,
    pub required_level: Level,
    #[serde(default)]
    pub description: String,
    pub competency_ids: Vec<String>,
}

impl Position {
    pub fn applies_to(&self, competency_id: &str) -> bool {
        self.competency_ids.iter().any(|id| id == competency_id)
    }
}

/// A department with its allowed peer roster size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: String,
    pub name: String,
    pub min_peer_raters: u32,
    pub max_peer_raters: u32,
}

impl Department {
    pub fn peer_bounds(&self) -> PeerBounds {
        PeerBounds {
            min: self.min_peer_raters,
            max: self.max_peer_raters,
        }
    }
}

/// Inclusive range of assigned peer raters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerBounds {
    pub min: u32,
    pub max: u32,
}

impl PeerBounds {
    pub fn new(min: u32, max: u32) -> Result<Self, ValidationError> {
        if min == 0 || min > max {
            return Err(ValidationError::InvalidPeerRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, count: usize) -> bool {
        count >= self.min as usize && count <= self.max as usize
    }
}

/// Maps functional competencies onto an organisational group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgUnitMapping {
    pub id: String,
    pub group_name: String,
    pub group_code: String,
    #[serde(default)]
    pub description: String,
    pub primary_competencies: Vec<String>,
    #[serde(default)]
    pub secondary_competencies: Vec<String>,
    #[serde(default)]
    pub organizational_units: Vec<String>,
}

impl OrgUnitMapping {
    /// Whether a department name belongs to this group.
    ///
    /// Matches case-insensitively when either name contains the other.
    pub fn covers_department(&self, department_name: &str) -> bool {
        let dept = department_name.trim().to_lowercase();
        if dept.is_empty() {
            return false;
        }
        self.organizational_units.iter().any(|unit| {
            let unit = unit.to_lowercase();
            dept.contains(&unit) || unit.contains(&dept)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> OrgUnitMapping {
        OrgUnitMapping {
            id: "legal".into(),
            group_name: "Legal and Regulatory Unit".into(),
            group_code: "LEGAL".into(),
            description: String::new(),
            primary_competencies: vec!["F1".into(), "F2".into()],
            secondary_competencies: vec!["F3".into()],
            organizational_units: vec!["Legal Unit".into()],
        }
    }

    #[test]
    fn peer_bounds_inclusive() {
        let b = PeerBounds::new(2, 3).unwrap();
        assert!(!b.contains(1));
        assert!(b.contains(2));
        assert!(b.contains(3));
        assert!(!b.contains(4));
    }

    #[test]
    fn peer_bounds_reject_inverted_range() {
        assert_eq!(
            PeerBounds::new(4, 2),
            Err(ValidationError::InvalidPeerRange { min: 4, max: 2 })
        );
    }

    #[test]
    fn peer_bounds_require_at_least_one_rater() {
        assert_eq!(
            PeerBounds::new(0, 0),
            Err(ValidationError::InvalidPeerRange { min: 0, max: 0 })
        );
        assert!(PeerBounds::new(0, 3).is_err());
        assert!(PeerBounds::new(1, 1).is_ok());
    }

    #[test]
    fn covers_department_either_direction() {
        let m = mapping();
        assert!(m.covers_department("legal unit"));
        assert!(m.covers_department("Legal"));
        assert!(m.covers_department("The Legal Unit Office"));
        assert!(!m.covers_department("Data Center"));
        assert!(!m.covers_department("  "));
    }
}
