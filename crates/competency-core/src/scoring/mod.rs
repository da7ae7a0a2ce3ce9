mod engine;
mod weights;

pub use engine::{
    analyze, classify, peer_average, perception_gap, weighted_score, GapResult, GapStatus,
    RatingSources, ScoreInputs,
};
pub use weights::RaterWeights;
