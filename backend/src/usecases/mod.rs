pub mod entitlements;
pub mod listings;
pub mod subscriptions;
