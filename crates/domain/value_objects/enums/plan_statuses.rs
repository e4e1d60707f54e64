use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Active,
    #[default]
    Inactive,
    Draft,
}

impl Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            PlanStatus::Active => "active",
            PlanStatus::Inactive => "inactive",
            PlanStatus::Draft => "draft",
        };
        write!(f, "{}", status)
    }
}

impl PlanStatus {
    /// Anything unknown is treated as inactive so it can never be subscribed to.
    pub fn from_str(value: &str) -> Self {
        match value {
            "active" => PlanStatus::Active,
            "draft" => PlanStatus::Draft,
            _ => PlanStatus::Inactive,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, PlanStatus::Active)
    }
}
