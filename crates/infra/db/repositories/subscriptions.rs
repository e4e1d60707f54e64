use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, dsl::count_star, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{plans, subscriptions, users},
    },
};
use domain::{
    entities::{
        plans::{PlanEntity, PlanRow},
        subscriptions::{
            InsertSubscriptionEntity, SubscriptionDetails, SubscriptionEntity,
            SubscriptionWithPlan,
        },
        users::VendorEntity,
    },
    repositories::subscriptions::SubscriptionRepository,
    value_objects::subscriptions::ListSubscriptionsFilter,
};

pub struct SubscriptionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

fn with_plan((subscription, plan): (SubscriptionEntity, PlanRow)) -> SubscriptionWithPlan {
    SubscriptionWithPlan {
        subscription,
        plan: PlanEntity::from(plan),
    }
}

#[async_trait]
impl SubscriptionRepository for SubscriptionPostgres {
    async fn find_active_subscription(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<SubscriptionWithPlan>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let current = subscriptions::table
            .inner_join(plans::table)
            .filter(subscriptions::user_id.eq(user_id))
            .filter(subscriptions::is_active.eq(true))
            .filter(subscriptions::end_date.ge(now))
            .order((subscriptions::created_at.desc(), subscriptions::id.desc()))
            .select((SubscriptionEntity::as_select(), PlanRow::as_select()))
            .first::<(SubscriptionEntity, PlanRow)>(&mut conn)
            .optional()?;

        Ok(current.map(with_plan))
    }

    async fn find_active_for_plan(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
    ) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let existing = subscriptions::table
            .filter(subscriptions::user_id.eq(user_id))
            .filter(subscriptions::plan_id.eq(plan_id))
            .filter(subscriptions::is_active.eq(true))
            .select(SubscriptionEntity::as_select())
            .first::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(existing)
    }

    async fn find_by_id_for_user(
        &self,
        user_id: Uuid,
        subscription_id: Uuid,
    ) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let subscription = subscriptions::table
            .filter(subscriptions::id.eq(subscription_id))
            .filter(subscriptions::user_id.eq(user_id))
            .select(SubscriptionEntity::as_select())
            .first::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(subscription)
    }

    async fn find_details(&self, subscription_id: Uuid) -> Result<Option<SubscriptionDetails>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let details = subscriptions::table
            .inner_join(plans::table)
            .inner_join(users::table)
            .filter(subscriptions::id.eq(subscription_id))
            .select((
                SubscriptionEntity::as_select(),
                PlanRow::as_select(),
                VendorEntity::as_select(),
            ))
            .first::<(SubscriptionEntity, PlanRow, VendorEntity)>(&mut conn)
            .optional()?;

        Ok(details.map(|(subscription, plan, vendor)| SubscriptionDetails {
            subscription,
            plan: plan.into(),
            vendor,
        }))
    }

    async fn insert_subscription(
        &self,
        insert_subscription_entity: InsertSubscriptionEntity,
    ) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // The partial unique index on (user_id, plan_id) WHERE is_active turns a duplicate
        // into an empty RETURNING set.
        let inserted = insert_into(subscriptions::table)
            .values(&insert_subscription_entity)
            .on_conflict_do_nothing()
            .returning(SubscriptionEntity::as_returning())
            .get_result::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(inserted)
    }

    async fn update_subscription_active(
        &self,
        subscription_id: Uuid,
        is_active: bool,
    ) -> Result<SubscriptionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let subscription = update(subscriptions::table)
            .filter(subscriptions::id.eq(subscription_id))
            .set((
                subscriptions::is_active.eq(is_active),
                subscriptions::updated_at.eq(Utc::now()),
            ))
            .returning(SubscriptionEntity::as_returning())
            .get_result::<SubscriptionEntity>(&mut conn)?;

        Ok(subscription)
    }

    async fn list_subscriptions(
        &self,
        user_id: Uuid,
        filter: ListSubscriptionsFilter,
    ) -> Result<Vec<SubscriptionWithPlan>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = subscriptions::table
            .inner_join(plans::table)
            .filter(subscriptions::user_id.eq(user_id))
            .select((SubscriptionEntity::as_select(), PlanRow::as_select()))
            .into_boxed();

        if let Some(is_active) = filter.state.is_active() {
            query = query.filter(subscriptions::is_active.eq(is_active));
        }

        let rows = query
            .order((subscriptions::created_at.desc(), subscriptions::id.desc()))
            .limit(filter.limit)
            .offset(filter.offset)
            .load::<(SubscriptionEntity, PlanRow)>(&mut conn)?;

        Ok(rows.into_iter().map(with_plan).collect())
    }

    async fn count_subscriptions(
        &self,
        user_id: Uuid,
        filter: ListSubscriptionsFilter,
    ) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = subscriptions::table
            .filter(subscriptions::user_id.eq(user_id))
            .select(count_star())
            .into_boxed();

        if let Some(is_active) = filter.state.is_active() {
            query = query.filter(subscriptions::is_active.eq(is_active));
        }

        let total = query.first::<i64>(&mut conn)?;

        Ok(total)
    }
}
