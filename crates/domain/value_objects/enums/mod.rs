pub mod billing_intervals;
pub mod listing_statuses;
pub mod owner_types;
pub mod plan_statuses;
