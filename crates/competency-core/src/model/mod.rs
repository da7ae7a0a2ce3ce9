//! Domain records stored in the document store.

pub mod assessment;
pub mod competency;
pub mod cycle;
pub mod org;
pub mod plan;
pub mod user;

pub use assessment::{
    Assessment, AssessmentStatus, PeerStatus, RaterType, Rating, RatingMap, RatingStatus,
    SelfStatus, SuperiorStatus,
};
pub use competency::{level_name, Competency, CompetencyType, Level, ProficiencyLevel};
pub use cycle::{AssessmentCycle, CycleStatus};
pub use org::{Department, OrgUnitMapping, PeerBounds, Position};
pub use plan::{
    ActivityKind, ActivityStatus, DevelopmentActivity, DevelopmentNeed, DevelopmentPlan,
    PlanStatus,
};
pub use user::{is_supervisor_position, User, UserRole};
