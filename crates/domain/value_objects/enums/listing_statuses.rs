use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Active,
    #[default]
    Pending,
    Inactive,
    Rejected,
}

impl Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            ListingStatus::Active => "active",
            ListingStatus::Pending => "pending",
            ListingStatus::Inactive => "inactive",
            ListingStatus::Rejected => "rejected",
        };
        write!(f, "{}", status)
    }
}

impl ListingStatus {
    pub fn from_str(value: &str) -> Self {
        match value {
            "active" => ListingStatus::Active,
            "pending" => ListingStatus::Pending,
            "rejected" => ListingStatus::Rejected,
            _ => ListingStatus::Inactive,
        }
    }

    /// Statuses that occupy a slot in a vendor's plan quota.
    pub fn quota_counted() -> [ListingStatus; 2] {
        [ListingStatus::Active, ListingStatus::Pending]
    }
}
