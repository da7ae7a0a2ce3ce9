use clap::Subcommand;
use competency_core::model::CompetencyType;
use competency_core::service::OrgGroupScope;

use crate::common::{print_json, CliResult, Session};

#[derive(Subcommand)]
pub enum CatalogAction {
    /// Seed empty catalog collections from the embedded catalog
    Seed {
        /// Replace the existing catalog
        #[arg(long)]
        force: bool,
    },
    /// Delete the catalog collections
    Clear,
    /// List competencies
    Competencies {
        /// Only this type (core, leadership, functional)
        #[arg(long = "type")]
        competency_type: Option<CompetencyType>,
    },
    /// Show one competency with its proficiency levels
    Competency { id: String },
    /// List positions
    Positions,
    /// Show one position
    Position { id: String },
    /// List departments
    Departments,
    /// Change a department's peer rater range
    SetPeerRange {
        department_id: String,
        min: u32,
        max: u32,
    },
    /// List org-unit mappings
    OrgUnits,
    /// Competencies of an org group
    OrgGroup {
        group_id: String,
        /// primary, secondary or all
        #[arg(long, default_value = "all")]
        scope: OrgGroupScope,
    },
    /// Find the org group of a department name
    OrgUnitFor { department_name: String },
}

pub fn run(as_user: &str, action: CatalogAction) -> CliResult {
    let Session { app, principal } = Session::open(as_user)?;
    match action {
        CatalogAction::Seed { force } => {
            let summary = if force {
                app.force_seed_catalog(&principal)?
            } else {
                app.seed_catalog(&principal)?
            };
            print_json(&summary)?;
        }
        CatalogAction::Clear => print_json(&app.clear_catalog(&principal)?)?,
        CatalogAction::Competencies { competency_type } => {
            let list = match competency_type {
                Some(t) => app.competencies_by_type(t)?,
                None => app.competencies()?,
            };
            print_json(&list)?;
        }
        CatalogAction::Competency { id } => match app.competency(&id)? {
            Some(c) => print_json(&c)?,
            None => return Err(format!("competency '{id}' not found").into()),
        },
        CatalogAction::Positions => print_json(&app.positions()?)?,
        CatalogAction::Position { id } => match app.position(&id)? {
            Some(p) => print_json(&p)?,
            None => return Err(format!("position '{id}' not found").into()),
        },
        CatalogAction::Departments => print_json(&app.departments()?)?,
        CatalogAction::SetPeerRange {
            department_id,
            min,
            max,
        } => print_json(&app.update_department_peer_range(&principal, &department_id, min, max)?)?,
        CatalogAction::OrgUnits => print_json(&app.org_unit_mappings()?)?,
        CatalogAction::OrgGroup { group_id, scope } => {
            print_json(&app.competencies_for_org_group(&group_id, scope)?)?
        }
        CatalogAction::OrgUnitFor { department_name } => {
            print_json(&app.org_unit_for_department(&department_name)?)?
        }
    }
    Ok(())
}
