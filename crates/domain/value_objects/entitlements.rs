use thiserror::Error;

/// Why a vendor action was refused. The display text is shown to the API caller as is.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DenyReason {
    #[error("You do not have an active plan. Subscribe to a plan to continue.")]
    NoActivePlan,
    #[error("Your current plan is no longer available. Subscribe to an active plan to continue.")]
    PlanInactive,
    #[error("You have reached your plan's listing limit of {0}")]
    ListingLimitReached(i64),
    #[error("You have reached your plan's featured listing limit of {0}")]
    FeaturedLimitReached(i64),
    #[error("Unable to verify your plan entitlements right now. Please try again later.")]
    StorageError(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

impl From<DenyReason> for Decision {
    fn from(reason: DenyReason) -> Self {
        Decision::Deny(reason)
    }
}
