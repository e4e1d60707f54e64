use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::subscriptions::{
        InsertSubscriptionEntity, SubscriptionDetails, SubscriptionEntity, SubscriptionWithPlan,
    },
    value_objects::subscriptions::ListSubscriptionsFilter,
};

#[automock]
#[async_trait]
pub trait SubscriptionRepository {
    /// The vendor's current subscription: flagged active and `end_date >= now`, joined to
    /// its plan. When several plans qualify, the most recently created row wins.
    async fn find_active_subscription(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<SubscriptionWithPlan>>;

    /// Active row for the exact (user, plan) pair, regardless of dates.
    async fn find_active_for_plan(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
    ) -> Result<Option<SubscriptionEntity>>;

    async fn find_by_id_for_user(
        &self,
        user_id: Uuid,
        subscription_id: Uuid,
    ) -> Result<Option<SubscriptionEntity>>;

    async fn find_details(&self, subscription_id: Uuid) -> Result<Option<SubscriptionDetails>>;

    /// Returns `None` when the storage-level uniqueness rule on active (user, plan)
    /// rows rejected the insert.
    async fn insert_subscription(
        &self,
        insert_subscription_entity: InsertSubscriptionEntity,
    ) -> Result<Option<SubscriptionEntity>>;

    async fn update_subscription_active(
        &self,
        subscription_id: Uuid,
        is_active: bool,
    ) -> Result<SubscriptionEntity>;

    async fn list_subscriptions(
        &self,
        user_id: Uuid,
        filter: ListSubscriptionsFilter,
    ) -> Result<Vec<SubscriptionWithPlan>>;

    async fn count_subscriptions(
        &self,
        user_id: Uuid,
        filter: ListSubscriptionsFilter,
    ) -> Result<i64>;
}
