use serde::{Deserialize, Serialize};

use super::App;
use crate::access::{Action, Principal};
use crate::catalog::{self, Catalog, SeedSummary};
use crate::error::{CoreError, Result};
use crate::model::{Competency, CompetencyType, Department, OrgUnitMapping, PeerBounds, Position};
use crate::storage::{DocumentStore, DocumentStoreExt};

/// Which competencies of an org group to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgGroupScope {
    Primary,
    Secondary,
    #[default]
    All,
}

impl std::str::FromStr for OrgGroupScope {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "primary" => Ok(OrgGroupScope::Primary),
            "secondary" => Ok(OrgGroupScope::Secondary),
            "all" => Ok(OrgGroupScope::All),
            other => Err(crate::error::ValidationError::InvalidValue {
                field: "scope".into(),
                message: format!("unknown scope '{other}'"),
            }),
        }
    }
}

impl<S: DocumentStore> App<S> {
    pub fn seed_catalog(&self, principal: &Principal) -> Result<SeedSummary> {
        self.check(principal, Action::SeedCatalog)?;
        catalog::seed(self.store(), &Catalog::embedded()?)
    }

    pub fn force_seed_catalog(&self, principal: &Principal) -> Result<SeedSummary> {
        self.check(principal, Action::SeedCatalog)?;
        catalog::force_seed(self.store(), &Catalog::embedded()?)
    }

    pub fn clear_catalog(&self, principal: &Principal) -> Result<SeedSummary> {
        self.check(principal, Action::ClearCatalog)?;
        catalog::clear(self.store())
    }

    /// Every competency, Core first, then Leadership, then Functional.
    pub fn competencies(&self) -> Result<Vec<Competency>> {
        let mut all: Vec<Competency> = self.store().list()?;
        all.sort_by(|a, b| a.catalog_order().cmp(&b.catalog_order()));
        Ok(all)
    }

    pub fn competencies_by_type(&self, competency_type: CompetencyType) -> Result<Vec<Competency>> {
        Ok(self
            .competencies()?
            .into_iter()
            .filter(|c| c.competency_type == competency_type)
            .collect())
    }

    pub fn core_competencies(&self) -> Result<Vec<Competency>> {
        self.competencies_by_type(CompetencyType::Core)
    }

    pub fn competency(&self, id: &str) -> Result<Option<Competency>> {
        self.store().get(id)
    }

    pub fn positions(&self) -> Result<Vec<Position>> {
        let mut all: Vec<Position> = self.store().list()?;
        all.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(all)
    }

    pub fn position(&self, id: &str) -> Result<Option<Position>> {
        self.store().get(id)
    }

    pub fn departments(&self) -> Result<Vec<Department>> {
        let mut all: Vec<Department> = self.store().list()?;
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    pub fn department(&self, id: &str) -> Result<Option<Department>> {
        self.store().get(id)
    }

    pub fn update_department_peer_range(
        &self,
        principal: &Principal,
        department_id: &str,
        min: u32,
        max: u32,
    ) -> Result<Department> {
        self.check(principal, Action::EditDepartment)?;
        let bounds = PeerBounds::new(min, max)?;
        let mut department = self
            .department(department_id)?
            .ok_or_else(|| CoreError::not_found("departments", department_id))?;

        department.min_peer_raters = bounds.min;
        department.max_peer_raters = bounds.max;
        self.store().put(&department)?;
        tracing::info!(department = %department_id, min, max, "updated peer range");
        Ok(department)
    }

    /// Peer bounds for a department, falling back to the configured range.
    pub(crate) fn peer_bounds_for(&self, department_id: &str) -> Result<(PeerBounds, String)> {
        match self.department(department_id)? {
            Some(dept) => Ok((PeerBounds::new(dept.min_peer_raters, dept.max_peer_raters)?, dept.name)),
            None => {
                tracing::debug!(department = %department_id, "unknown department, using fallback peer range");
                Ok((self.config().peer_fallback()?, department_id.to_string()))
            }
        }
    }

    pub fn org_unit_mappings(&self) -> Result<Vec<OrgUnitMapping>> {
        self.store().list()
    }

    /// Competencies of an org group, in the order the group lists them.
    pub fn competencies_for_org_group(
        &self,
        group_id: &str,
        scope: OrgGroupScope,
    ) -> Result<Vec<Competency>> {
        let mapping: OrgUnitMapping = self
            .store()
            .get(group_id)?
            .ok_or_else(|| CoreError::not_found("org_unit_mappings", group_id))?;

        let ids: Vec<&String> = match scope {
            OrgGroupScope::Primary => mapping.primary_competencies.iter().collect(),
            OrgGroupScope::Secondary => mapping.secondary_competencies.iter().collect(),
            OrgGroupScope::All => mapping
                .primary_competencies
                .iter()
                .chain(mapping.secondary_competencies.iter())
                .collect(),
        };

        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(c) = self.competency(id)? {
                out.push(c);
            }
        }
        Ok(out)
    }

    pub fn org_unit_for_department(&self, department_name: &str) -> Result<Option<OrgUnitMapping>> {
        Ok(self
            .org_unit_mappings()?
            .into_iter()
            .find(|m| m.covers_department(department_name)))
    }
}
