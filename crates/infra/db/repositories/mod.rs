pub mod listings;
pub mod plans;
pub mod subscriptions;
