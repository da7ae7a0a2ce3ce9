//! Gap scoring engine.
//!
//! For each competency the available sources (self, peer average, superior)
//! are combined into a weighted score renormalized over the sources that are
//! present, so missing raters never pull the score towards zero:
//!
//! ```text
//! weighted_score = Σ score_i * w_i / Σ w_i      (present sources only)
//! gap            = required_level - weighted_score
//! status         = Met if gap <= 0 else DevelopmentNeed
//! ```

use serde::{Deserialize, Serialize};

use super::RaterWeights;
use crate::model::{Competency, CompetencyType, Level, RaterType, Rating};

/// Scores available for one competency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreInputs {
    pub self_score: Option<f64>,
    pub peer_average: Option<f64>,
    pub superior_score: Option<f64>,
}

/// Renormalized weighted score; 0 when no source is present.
pub fn weighted_score(inputs: &ScoreInputs, weights: &RaterWeights) -> f64 {
    let sources = [
        (inputs.self_score, weights.self_weight),
        (inputs.peer_average, weights.peer),
        (inputs.superior_score, weights.superior),
    ];

    let (weighted_sum, total_weight) = sources
        .iter()
        .filter_map(|(score, weight)| score.map(|s| (s * weight, *weight)))
        .fold((0.0, 0.0), |(sum, total), (contrib, w)| (sum + contrib, total + w));

    if total_weight > 0.0 {
        weighted_sum / total_weight
    } else {
        0.0
    }
}

/// Mean of the peer scores, or `None` when there are none.
pub fn peer_average<I>(scores: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = scores
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), s| (sum + s, n + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Absolute difference between self and superior views, when both exist.
pub fn perception_gap(self_score: Option<Level>, superior_score: Option<Level>) -> Option<u8> {
    match (self_score, superior_score) {
        (Some(s), Some(sup)) => Some(s.get().abs_diff(sup.get())),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapStatus {
    Met,
    DevelopmentNeed,
}

/// Gap against the required level and its classification. A zero gap is met.
pub fn classify(required_level: Level, weighted_score: f64) -> (f64, GapStatus) {
    let gap = required_level.as_f64() - weighted_score;
    let status = if gap <= 0.0 {
        GapStatus::Met
    } else {
        GapStatus::DevelopmentNeed
    };
    (gap, status)
}

/// Per-competency outcome of a gap analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapResult {
    pub competency_id: String,
    pub competency_name: String,
    pub competency_type: CompetencyType,
    pub required_level: Level,
    pub weighted_score: f64,
    pub self_score: Option<Level>,
    pub peer_average: Option<f64>,
    pub superior_score: Option<Level>,
    pub gap: f64,
    pub status: GapStatus,
    pub perception_gap: Option<u8>,
}

impl GapResult {
    pub fn is_met(&self) -> bool {
        self.status == GapStatus::Met
    }
}

/// Completed ratings of one assessment, split by source.
#[derive(Debug, Clone, Default)]
pub struct RatingSources<'a> {
    pub self_rating: Option<&'a Rating>,
    pub peers: Vec<&'a Rating>,
    pub superior: Option<&'a Rating>,
}

impl<'a> RatingSources<'a> {
    /// Group completed ratings; pending peer slots are ignored.
    pub fn from_ratings(ratings: &'a [Rating]) -> Self {
        let mut sources = RatingSources::default();
        for rating in ratings.iter().filter(|r| r.is_completed()) {
            match rating.rater_type {
                RaterType::SelfRater => {
                    sources.self_rating = latest(sources.self_rating, rating);
                }
                RaterType::Peer => sources.peers.push(rating),
                RaterType::Superior => {
                    sources.superior = latest(sources.superior, rating);
                }
            }
        }
        sources
    }

    /// Inputs for one competency. Peers who left it unrated are excluded
    /// from the average rather than counted as zero.
    pub fn inputs_for(&self, competency_id: &str) -> ScoreInputs {
        ScoreInputs {
            self_score: self.self_level(competency_id).map(Level::as_f64),
            peer_average: peer_average(
                self.peers
                    .iter()
                    .filter_map(|r| r.level_for(competency_id))
                    .map(Level::as_f64),
            ),
            superior_score: self.superior_level(competency_id).map(Level::as_f64),
        }
    }

    fn self_level(&self, competency_id: &str) -> Option<Level> {
        self.self_rating.and_then(|r| r.level_for(competency_id))
    }

    fn superior_level(&self, competency_id: &str) -> Option<Level> {
        self.superior.and_then(|r| r.level_for(competency_id))
    }
}

fn latest<'a>(current: Option<&'a Rating>, candidate: &'a Rating) -> Option<&'a Rating> {
    match current {
        Some(existing) if existing.submitted_at >= candidate.submitted_at => Some(existing),
        _ => Some(candidate),
    }
}

/// Score every competency against a single required level.
pub fn analyze(
    competencies: &[Competency],
    required_level: Level,
    sources: &RatingSources<'_>,
    weights: &RaterWeights,
) -> Vec<GapResult> {
    competencies
        .iter()
        .map(|competency| {
            let inputs = sources.inputs_for(&competency.id);
            let score = weighted_score(&inputs, weights);
            let (gap, status) = classify(required_level, score);
            let self_score = sources.self_level(&competency.id);
            let superior_score = sources.superior_level(&competency.id);
            GapResult {
                competency_id: competency.id.clone(),
                competency_name: competency.name.clone(),
                competency_type: competency.competency_type,
                required_level,
                weighted_score: score,
                self_score,
                peer_average: inputs.peer_average,
                superior_score,
                gap,
                status,
                perception_gap: perception_gap(self_score, superior_score),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RatingMap;
    use chrono::Utc;

    const EPS: f64 = 1e-9;

    fn level(v: i64) -> Level {
        Level::new(v).unwrap()
    }

    fn rating(rater_type: RaterType, rater: &str, pairs: &[(&str, i64)]) -> Rating {
        let map: RatingMap = pairs.iter().map(|(id, v)| (id.to_string(), level(*v))).collect();
        Rating::submitted("a1", rater_type, rater, map, Utc::now())
    }

    fn competency(id: &str) -> Competency {
        Competency {
            id: id.into(),
            name: format!("Competency {id}"),
            competency_type: CompetencyType::Core,
            description: String::new(),
            proficiency_levels: Vec::new(),
        }
    }

    #[test]
    fn full_participation_is_plain_weighted_average() {
        let inputs = ScoreInputs {
            self_score: Some(2.0),
            peer_average: Some(3.0),
            superior_score: Some(4.0),
        };
        let score = weighted_score(&inputs, &RaterWeights::default());
        assert!((score - 3.3).abs() < EPS);

        let (gap, status) = classify(level(3), score);
        assert!((gap + 0.3).abs() < EPS);
        assert_eq!(status, GapStatus::Met);
    }

    #[test]
    fn self_only_renormalizes() {
        let inputs = ScoreInputs {
            self_score: Some(1.0),
            ..Default::default()
        };
        let score = weighted_score(&inputs, &RaterWeights::default());
        assert!((score - 1.0).abs() < EPS);

        let (gap, status) = classify(level(2), score);
        assert!((gap - 1.0).abs() < EPS);
        assert_eq!(status, GapStatus::DevelopmentNeed);
    }

    #[test]
    fn self_and_superior_renormalize_to_their_weights() {
        let inputs = ScoreInputs {
            self_score: Some(2.0),
            peer_average: None,
            superior_score: Some(4.0),
        };
        // (2*0.2 + 4*0.5) / 0.7
        let expected = 2.4 / 0.7;
        assert!((weighted_score(&inputs, &RaterWeights::default()) - expected).abs() < EPS);
    }

    #[test]
    fn no_sources_scores_zero() {
        let score = weighted_score(&ScoreInputs::default(), &RaterWeights::default());
        assert_eq!(score, 0.0);
        let (gap, status) = classify(level(3), score);
        assert_eq!(gap, 3.0);
        assert_eq!(status, GapStatus::DevelopmentNeed);
    }

    #[test]
    fn zero_gap_is_met() {
        let (gap, status) = classify(level(3), 3.0);
        assert_eq!(gap, 0.0);
        assert_eq!(status, GapStatus::Met);
    }

    #[test]
    fn empty_peer_set_is_absent() {
        assert_eq!(peer_average(Vec::<f64>::new()), None);
        assert_eq!(peer_average(vec![2.0, 4.0]), Some(3.0));
    }

    #[test]
    fn weights_not_summing_to_one_use_single_normalization() {
        let weights = RaterWeights::new(1.0, 1.0, 2.0).unwrap();
        let inputs = ScoreInputs {
            self_score: Some(2.0),
            peer_average: Some(2.0),
            superior_score: Some(4.0),
        };
        // (2 + 2 + 8) / 4
        assert!((weighted_score(&inputs, &weights) - 3.0).abs() < EPS);
    }

    #[test]
    fn perception_gap_needs_both_views() {
        assert_eq!(perception_gap(Some(level(1)), Some(level(4))), Some(3));
        assert_eq!(perception_gap(Some(level(3)), None), None);
    }

    #[test]
    fn analyze_skips_unrated_peer_entries() {
        let ratings = vec![
            rating(RaterType::SelfRater, "u1", &[("C1", 2), ("C2", 3)]),
            rating(RaterType::Peer, "p1", &[("C1", 4)]),
            rating(RaterType::Peer, "p2", &[("C1", 2), ("C2", 2)]),
            Rating::pending_peer("a1", "p3", Utc::now()),
        ];
        let sources = RatingSources::from_ratings(&ratings);
        assert_eq!(sources.peers.len(), 2);

        let results = analyze(
            &[competency("C1"), competency("C2")],
            level(3),
            &sources,
            &RaterWeights::default(),
        );
        assert_eq!(results[0].peer_average, Some(3.0));
        assert_eq!(results[1].peer_average, Some(2.0));
        assert_eq!(results[0].superior_score, None);
        assert_eq!(results[0].perception_gap, None);
    }

    #[test]
    fn analyze_reports_sources_and_perception_gap() {
        let ratings = vec![
            rating(RaterType::SelfRater, "u1", &[("C1", 2)]),
            rating(RaterType::Peer, "p1", &[("C1", 3)]),
            rating(RaterType::Superior, "boss", &[("C1", 4)]),
        ];
        let sources = RatingSources::from_ratings(&ratings);
        let results = analyze(
            &[competency("C1")],
            level(3),
            &sources,
            &RaterWeights::default(),
        );
        let r = &results[0];
        assert!((r.weighted_score - 3.3).abs() < EPS);
        assert_eq!(r.self_score, Some(level(2)));
        assert_eq!(r.superior_score, Some(level(4)));
        assert_eq!(r.perception_gap, Some(2));
        assert!(r.is_met());
    }
}
