pub mod billing_periods;
pub mod entitlements;
pub mod enums;
pub mod listings;
pub mod plans;
pub mod subscriptions;
