use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanDuration {
    #[default]
    Month,
    Year,
}

impl Display for PlanDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let duration = match self {
            PlanDuration::Month => "month",
            PlanDuration::Year => "year",
        };
        write!(f, "{}", duration)
    }
}

impl PlanDuration {
    /// Anything that is not `year` folds to `month`.
    pub fn from_str(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "year" => PlanDuration::Year,
            _ => PlanDuration::Month,
        }
    }
}
