use std::fmt::Display;

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BillingInterval {
    #[default]
    Monthly,
    Quarterly,
    HalfYearly,
    Yearly,
}

impl BillingInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingInterval::Monthly => "monthly",
            BillingInterval::Quarterly => "quarterly",
            BillingInterval::HalfYearly => "half-yearly",
            BillingInterval::Yearly => "yearly",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim() {
            "monthly" => Some(BillingInterval::Monthly),
            "quarterly" => Some(BillingInterval::Quarterly),
            "half-yearly" | "half_yearly" => Some(BillingInterval::HalfYearly),
            "yearly" => Some(BillingInterval::Yearly),
            _ => None,
        }
    }

    /// Parses a stored interval, falling back to monthly for anything unrecognized.
    pub fn from_str_or_monthly(value: &str) -> Self {
        Self::from_str(value).unwrap_or_else(|| {
            warn!(
                interval = value,
                "billing_periods: unrecognized billing interval, falling back to monthly"
            );
            BillingInterval::Monthly
        })
    }

    pub fn months(&self) -> u32 {
        match self {
            BillingInterval::Monthly => 1,
            BillingInterval::Quarterly => 3,
            BillingInterval::HalfYearly => 6,
            BillingInterval::Yearly => 12,
        }
    }
}

impl Display for BillingInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
