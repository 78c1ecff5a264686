use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Athlete {
  pub id: String,
  pub name: String,
  /// Unit-agnostic bodyweight, unknown for many athletes
  pub bodyweight: Option<f64>,
}
