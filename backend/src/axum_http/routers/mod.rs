pub mod listings;
pub mod subscriptions;
