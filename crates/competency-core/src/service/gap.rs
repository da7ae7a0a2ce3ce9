use serde::{Deserialize, Serialize};

use super::App;
use crate::access::{Action, Principal};
use crate::error::{CoreError, Result};
use crate::model::{Level, Position, User};
use crate::scoring::{self, GapResult, RaterWeights, RatingSources};
use crate::storage::{DocumentStore, DocumentStoreExt};

/// Gap results of one assessment against a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapAnalysis {
    pub assessment_id: String,
    pub subject_user_id: String,
    pub cycle_id: String,
    pub position_id: String,
    pub required_level: Level,
    pub weights: RaterWeights,
    pub results: Vec<GapResult>,
}

impl GapAnalysis {
    pub fn development_needs(&self) -> impl Iterator<Item = &GapResult> {
        self.results.iter().filter(|r| !r.is_met())
    }
}

impl<S: DocumentStore> App<S> {
    /// Gap analysis against the subject's position, or `position_id` when given.
    pub fn gap_analysis(
        &self,
        principal: &Principal,
        assessment_id: &str,
        position_id: Option<&str>,
    ) -> Result<GapAnalysis> {
        let assessment = self.require_assessment(assessment_id)?;
        let subject = self.store().get::<User>(&assessment.subject_user_id)?;
        self.check(
            principal,
            Action::ViewGapAnalysis {
                subject_id: &assessment.subject_user_id,
                supervisor_id: subject.as_ref().and_then(|u| u.supervisor_id.as_deref()),
            },
        )?;
        self.analyze_assessment(assessment_id, position_id)
    }

    pub(crate) fn analyze_assessment(
        &self,
        assessment_id: &str,
        position_id: Option<&str>,
    ) -> Result<GapAnalysis> {
        let assessment = self.require_assessment(assessment_id)?;
        let position_id = position_id.unwrap_or(&assessment.subject_position_id);
        let position: Position = self
            .store()
            .get(position_id)?
            .ok_or_else(|| CoreError::not_found("positions", position_id))?;

        let cycle = self.cycle(&assessment.cycle_id)?;
        let weights = match &cycle {
            Some(c) => c.weights,
            None => {
                tracing::debug!(cycle = %assessment.cycle_id, "cycle missing, using configured weights");
                self.config().scoring.default_weights
            }
        };

        let competencies = self.required_competencies(&position, cycle.as_ref())?;
        let ratings = self.ratings_for(assessment_id)?;
        let sources = RatingSources::from_ratings(&ratings);
        let results = scoring::analyze(&competencies, position.required_level, &sources, &weights);

        tracing::debug!(
            assessment = %assessment_id,
            position = %position.id,
            needs = results.iter().filter(|r| !r.is_met()).count(),
            "computed gap analysis"
        );
        Ok(GapAnalysis {
            assessment_id: assessment.id,
            subject_user_id: assessment.subject_user_id,
            cycle_id: assessment.cycle_id,
            position_id: position.id,
            required_level: position.required_level,
            weights,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::GapStatus;
    use crate::service::fixtures::{uniform, Fixture, CORE};

    fn rated(fx: &Fixture) -> String {
        let a = fx
            .app
            .start_assessment(&fx.as_user("ana"), "ana", None)
            .unwrap();
        fx.app
            .assign_peer_raters(&fx.hr(), &a.id, vec!["p1".into(), "p2".into()])
            .unwrap();
        fx.app
            .submit_self_rating(&fx.as_user("ana"), &a.id, uniform(&CORE, 2))
            .unwrap();
        fx.app
            .submit_peer_rating(&fx.as_user("p1"), &a.id, uniform(&CORE, 3))
            .unwrap();
        fx.app
            .submit_superior_rating(&fx.as_user("boss"), &a.id, uniform(&CORE, 4))
            .unwrap();
        a.id
    }

    #[test]
    fn uses_position_level_and_cycle_weights() {
        let fx = Fixture::new();
        let id = rated(&fx);
        let analysis = fx.app.gap_analysis(&fx.as_user("ana"), &id, None).unwrap();

        assert_eq!(analysis.position_id, "legal-assistant-iii-1");
        assert_eq!(analysis.required_level.get(), 2);
        assert_eq!(analysis.results.len(), 5);
        let c1 = &analysis.results[0];
        assert_eq!(c1.competency_id, "C1");
        // 2*0.2 + 3*0.3 + 4*0.5
        assert!((c1.weighted_score - 3.3).abs() < 1e-9);
        assert_eq!(c1.status, GapStatus::Met);
        assert_eq!(c1.perception_gap, Some(2));
        assert_eq!(analysis.development_needs().count(), 0);
    }

    #[test]
    fn explicit_position_changes_required_level() {
        let fx = Fixture::new();
        let id = rated(&fx);
        let analysis = fx
            .app
            .gap_analysis(&fx.hr(), &id, Some("attorney-v"))
            .unwrap();
        assert_eq!(analysis.required_level.get(), 3);
        assert!(analysis.results.iter().all(|r| (r.gap + 0.3).abs() < 1e-9));

        assert!(matches!(
            fx.app.gap_analysis(&fx.hr(), &id, Some("astronaut")).unwrap_err(),
            CoreError::NotFound { collection: "positions", .. }
        ));
    }

    #[test]
    fn unrated_assessment_is_all_development_needs() {
        let fx = Fixture::new();
        let a = fx
            .app
            .start_assessment(&fx.as_user("ana"), "ana", None)
            .unwrap();
        let analysis = fx.app.gap_analysis(&fx.as_user("boss"), &a.id, None).unwrap();
        assert!(analysis
            .results
            .iter()
            .all(|r| r.weighted_score == 0.0 && r.gap == 2.0 && !r.is_met()));
    }

    #[test]
    fn peers_cannot_read_someone_elses_gaps() {
        let fx = Fixture::new();
        let id = rated(&fx);
        assert!(matches!(
            fx.app.gap_analysis(&fx.as_user("p1"), &id, None).unwrap_err(),
            CoreError::Access(_)
        ));
    }
}
