//! Structured reports built from gap analyses and assessment status.
//!
//! Three reports are provided:
//! - **Individual**: one assessment's gaps with a summary and a recommendation per need
//! - **Department**: status of every employee in a department plus gap aggregates
//! - **Completion**: per-department completion counts for a cycle
//!
//! Reports are plain data; rendering is left to the consumer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::access::{Action, Principal};
use crate::error::{CoreError, Result, ValidationError};
use crate::model::{
    Assessment, AssessmentCycle, AssessmentStatus, CompetencyType, PeerStatus, SelfStatus,
    SuperiorStatus, User,
};
use crate::scoring::GapResult;
use crate::service::{App, GapAnalysis};
use crate::storage::{DocumentStore, DocumentStoreExt};

/// Headline numbers of a gap list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GapSummary {
    /// Competencies analysed
    pub total: usize,
    /// Competencies at or above the required level
    pub met: usize,
    /// Competencies below the required level
    pub development_needs: usize,
    /// Mean of the positive gaps over all competencies (met counts as 0)
    pub average_gap: f64,
}

impl GapSummary {
    pub fn of(results: &[GapResult]) -> Self {
        let total = results.len();
        let met = results.iter().filter(|r| r.is_met()).count();
        let average_gap = if total == 0 {
            0.0
        } else {
            results.iter().map(|r| r.gap.max(0.0)).sum::<f64>() / total as f64
        };
        Self {
            total,
            met,
            development_needs: total - met,
            average_gap,
        }
    }
}

/// Urgency of a development need, from the size of its gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationTier {
    /// Gap above 2
    Priority,
    /// Gap above 1
    Moderate,
    Minor,
}

impl RecommendationTier {
    pub fn for_gap(gap: f64) -> Self {
        if gap > 2.0 {
            RecommendationTier::Priority
        } else if gap > 1.0 {
            RecommendationTier::Moderate
        } else {
            RecommendationTier::Minor
        }
    }

    pub fn advice(self) -> &'static str {
        match self {
            RecommendationTier::Priority => {
                "Priority focus area. Consider formal training, mentoring, and structured learning programs."
            }
            RecommendationTier::Moderate => {
                "Moderate development need. On-the-job learning, coaching, and self-study recommended."
            }
            RecommendationTier::Minor => {
                "Minor improvement needed. Targeted practice and feedback will help close the gap."
            }
        }
    }
}

/// Colour tier a consumer can use to render a gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTier {
    Success,
    Warning,
    Danger,
}

impl StatusTier {
    pub fn for_gap(gap: f64) -> Self {
        if gap <= 0.0 {
            StatusTier::Success
        } else if gap <= 1.0 {
            StatusTier::Warning
        } else {
            StatusTier::Danger
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub competency_id: String,
    pub competency_name: String,
    pub gap: f64,
    pub tier: RecommendationTier,
    pub advice: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualRow {
    #[serde(flatten)]
    pub result: GapResult,
    /// Name of the level nearest the weighted score
    pub level_name: String,
    pub tier: StatusTier,
}

/// Gap report for one assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualReport {
    pub user_id: String,
    pub user_name: String,
    pub position_id: String,
    pub cycle_id: String,
    pub assessment_status: AssessmentStatus,
    pub summary: GapSummary,
    pub rows: Vec<IndividualRow>,
    /// One entry per development need, largest gap first
    pub recommendations: Vec<Recommendation>,
    pub generated_at: DateTime<Utc>,
}

impl IndividualReport {
    pub fn build(user: &User, assessment: &Assessment, analysis: &GapAnalysis) -> Self {
        let rows = analysis
            .results
            .iter()
            .map(|r| IndividualRow {
                level_name: crate::model::level_name(r.weighted_score).to_string(),
                tier: StatusTier::for_gap(r.gap),
                result: r.clone(),
            })
            .collect();

        let mut recommendations: Vec<Recommendation> = analysis
            .development_needs()
            .map(|r| {
                let tier = RecommendationTier::for_gap(r.gap);
                Recommendation {
                    competency_id: r.competency_id.clone(),
                    competency_name: r.competency_name.clone(),
                    gap: r.gap,
                    tier,
                    advice: tier.advice().to_string(),
                }
            })
            .collect();
        recommendations.sort_by(|a, b| b.gap.total_cmp(&a.gap));

        Self {
            user_id: user.id.clone(),
            user_name: user.name.clone(),
            position_id: analysis.position_id.clone(),
            cycle_id: assessment.cycle_id.clone(),
            assessment_status: assessment.status,
            summary: GapSummary::of(&analysis.results),
            rows,
            recommendations,
            generated_at: Utc::now(),
        }
    }
}

/// Where one employee stands in a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeStatus {
    pub user_id: String,
    pub name: String,
    pub position_id: String,
    pub assessment_id: Option<String>,
    pub self_status: SelfStatus,
    pub peer_status: PeerStatus,
    pub superior_status: SuperiorStatus,
    pub status: AssessmentStatus,
}

impl EmployeeStatus {
    fn new(user: &User, assessment: Option<&Assessment>) -> Self {
        Self {
            user_id: user.id.clone(),
            name: user.name.clone(),
            position_id: user.position_id.clone(),
            assessment_id: assessment.map(|a| a.id.clone()),
            self_status: assessment.map(|a| a.self_status).unwrap_or_default(),
            peer_status: assessment.map(|a| a.peer_status).unwrap_or_default(),
            superior_status: assessment.map(|a| a.superior_status).unwrap_or_default(),
            status: assessment.map(|a| a.status).unwrap_or_default(),
        }
    }
}

/// Gap aggregate for one competency across a department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetencyGapSummary {
    pub competency_id: String,
    pub competency_name: String,
    pub competency_type: CompetencyType,
    /// Mean signed gap over the assessed employees
    pub average_gap: f64,
    pub met: usize,
    pub development_needs: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentReport {
    pub department_id: String,
    pub department_name: String,
    pub cycle_id: String,
    pub cycle_name: String,
    pub total_employees: usize,
    /// Employees whose assessment is completed
    pub assessed_employees: usize,
    /// Percentage, 0-100
    pub completion_rate: f64,
    pub employees: Vec<EmployeeStatus>,
    /// Only completed assessments contribute
    pub competencies: Vec<CompetencyGapSummary>,
}

#[derive(Debug, Clone, Default)]
struct GapAccumulator {
    name: String,
    competency_type: Option<CompetencyType>,
    gaps: Vec<f64>,
    met: usize,
}

/// Aggregate gap results of several employees per competency, in catalog order.
pub fn summarize_competencies<'a, I>(analyses: I) -> Vec<CompetencyGapSummary>
where
    I: IntoIterator<Item = &'a GapAnalysis>,
{
    let mut by_competency: BTreeMap<(CompetencyType, String), GapAccumulator> = BTreeMap::new();
    for analysis in analyses {
        for r in &analysis.results {
            let acc = by_competency
                .entry((r.competency_type, r.competency_id.clone()))
                .or_default();
            acc.name.clone_from(&r.competency_name);
            acc.competency_type = Some(r.competency_type);
            acc.gaps.push(r.gap);
            if r.is_met() {
                acc.met += 1;
            }
        }
    }

    by_competency
        .into_iter()
        .map(|((competency_type, competency_id), acc)| {
            let n = acc.gaps.len();
            CompetencyGapSummary {
                competency_id,
                competency_name: acc.name,
                competency_type: acc.competency_type.unwrap_or(competency_type),
                average_gap: acc.gaps.iter().sum::<f64>() / n as f64,
                met: acc.met,
                development_needs: n - acc.met,
            }
        })
        .collect()
}

/// Completion counts of one department.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepartmentCompletion {
    pub department_id: String,
    pub department_name: String,
    pub total_employees: usize,
    pub completed_assessments: usize,
    pub self_complete: usize,
    pub peer_complete: usize,
    pub superior_complete: usize,
    /// Percentage, 0-100
    pub completion_rate: f64,
}

impl DepartmentCompletion {
    fn record(&mut self, assessment: Option<&Assessment>) {
        self.total_employees += 1;
        let Some(a) = assessment else { return };
        if a.status == AssessmentStatus::Completed {
            self.completed_assessments += 1;
        }
        if a.self_status == SelfStatus::Completed {
            self.self_complete += 1;
        }
        if a.peer_status == PeerStatus::Completed {
            self.peer_complete += 1;
        }
        if a.superior_status == SuperiorStatus::Completed {
            self.superior_complete += 1;
        }
    }
}

/// Percentage of `part` in `total`; 0 when `total` is 0.
pub fn completion_rate(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionReport {
    pub cycle_id: String,
    pub cycle_name: String,
    /// Departments with at least one employee
    pub departments: Vec<DepartmentCompletion>,
    pub total_employees: usize,
    pub completed_assessments: usize,
    pub completion_rate: f64,
}

impl<S: DocumentStore> App<S> {
    fn report_cycle(&self, cycle_id: Option<&str>) -> Result<AssessmentCycle> {
        match cycle_id {
            Some(id) => self
                .cycle(id)?
                .ok_or_else(|| CoreError::not_found("assessment_cycles", id)),
            None => Ok(self.active_cycle()?.ok_or(ValidationError::NoActiveCycle)?),
        }
    }

    fn cycle_assessment(&self, user_id: &str, cycle_id: &str) -> Result<Option<Assessment>> {
        self.store().get(&Assessment::id_for(user_id, cycle_id))
    }

    /// Gap report for one assessment. Readable by whoever may see its gap analysis.
    pub fn individual_report(&self, principal: &Principal, assessment_id: &str) -> Result<IndividualReport> {
        let analysis = self.gap_analysis(principal, assessment_id, None)?;
        let assessment = self.require_assessment(assessment_id)?;
        let user = self.require_user(&assessment.subject_user_id)?;
        Ok(IndividualReport::build(&user, &assessment, &analysis))
    }

    /// Department summary for a cycle (the active cycle when `cycle_id` is `None`).
    pub fn department_report(
        &self,
        principal: &Principal,
        department_id: &str,
        cycle_id: Option<&str>,
    ) -> Result<DepartmentReport> {
        self.check(principal, Action::ViewReports)?;
        let department = self
            .department(department_id)?
            .ok_or_else(|| CoreError::not_found("departments", department_id))?;
        let cycle = self.report_cycle(cycle_id)?;

        let mut employees: Vec<User> = self.store().query("department_id", department_id)?;
        employees.sort_by(|a, b| a.name.cmp(&b.name));

        let mut rows = Vec::with_capacity(employees.len());
        let mut analyses = Vec::new();
        for user in &employees {
            let assessment = self.cycle_assessment(&user.id, &cycle.id)?;
            if let Some(a) = assessment.as_ref().filter(|a| a.status == AssessmentStatus::Completed) {
                analyses.push(self.analyze_assessment(&a.id, None)?);
            }
            rows.push(EmployeeStatus::new(user, assessment.as_ref()));
        }

        let assessed_employees = analyses.len();
        tracing::debug!(department = %department_id, assessed = assessed_employees, "built department report");
        Ok(DepartmentReport {
            department_id: department.id,
            department_name: department.name,
            cycle_id: cycle.id,
            cycle_name: cycle.name,
            total_employees: rows.len(),
            assessed_employees,
            completion_rate: completion_rate(assessed_employees, rows.len()),
            employees: rows,
            competencies: summarize_competencies(&analyses),
        })
    }

    /// Completion counts per department for a cycle.
    pub fn completion_report(&self, principal: &Principal, cycle_id: Option<&str>) -> Result<CompletionReport> {
        self.check(principal, Action::ViewReports)?;
        let cycle = self.report_cycle(cycle_id)?;

        let mut by_department: BTreeMap<String, DepartmentCompletion> = self
            .departments()?
            .into_iter()
            .map(|d| {
                let entry = DepartmentCompletion {
                    department_id: d.id.clone(),
                    department_name: d.name,
                    ..Default::default()
                };
                (d.id, entry)
            })
            .collect();

        for user in self.all_users()? {
            let assessment = self.cycle_assessment(&user.id, &cycle.id)?;
            by_department
                .entry(user.department_id.clone())
                .or_insert_with(|| DepartmentCompletion {
                    department_id: user.department_id.clone(),
                    department_name: user.department_id.clone(),
                    ..Default::default()
                })
                .record(assessment.as_ref());
        }

        let mut departments: Vec<DepartmentCompletion> = by_department
            .into_values()
            .filter(|d| d.total_employees > 0)
            .collect();
        for d in &mut departments {
            d.completion_rate = completion_rate(d.completed_assessments, d.total_employees);
        }
        departments.sort_by(|a, b| a.department_name.cmp(&b.department_name));

        let total_employees = departments.iter().map(|d| d.total_employees).sum();
        let completed_assessments = departments.iter().map(|d| d.completed_assessments).sum();
        Ok(CompletionReport {
            cycle_id: cycle.id,
            cycle_name: cycle.name,
            departments,
            total_employees,
            completed_assessments,
            completion_rate: completion_rate(completed_assessments, total_employees),
        })
    }
}
