pub mod plan;
pub mod player;
pub mod tournament;
pub mod training;

pub use plan::{
  AnnualTrainingPlan, DailyAssignment, LifecycleError, ModificationRequest, PlanStatus, Periodization,
  Urgency,
};
pub use player::{Category, PlayerBaseline};
pub use tournament::{Importance, ScheduledTournament, TournamentInput};
pub use training::{
  priorities_for, IntensityBand, LearningPhase, Period, Priority, SessionType, Setting,
};
