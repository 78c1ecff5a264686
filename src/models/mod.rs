pub mod athlete;
pub mod exercise;
pub mod plan;
pub mod session;
pub mod set;

pub use athlete::Athlete;
pub use exercise::{Exercise, ExerciseEntry};
pub use plan::{PlannedDay, TrainingPlan};
pub use session::{SessionStatus, SessionTotals, WorkoutSession};
pub use set::{SetEntry, SetType};
