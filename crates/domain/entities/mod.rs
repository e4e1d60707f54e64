pub mod listings;
pub mod plans;
pub mod subscriptions;
pub mod users;
