use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, dsl::count_star, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain;
use crate::infra::db::postgres::{postgres_connection::PgPoolSquad, schema::listings};
use domain::{
    entities::listings::{InsertListingEntity, ListingEntity},
    repositories::listings::ListingRepository,
    value_objects::{
        enums::{listing_statuses::ListingStatus, owner_types::OwnerType},
        listings::ListingUsage,
    },
};

pub struct ListingPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ListingPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ListingRepository for ListingPostgres {
    async fn count_vendor_listings(&self, user_id: Uuid) -> Result<ListingUsage> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let statuses: Vec<String> = ListingStatus::quota_counted()
            .iter()
            .map(ToString::to_string)
            .collect();

        let total = listings::table
            .filter(listings::owner_id.eq(user_id))
            .filter(listings::owner_type.eq(OwnerType::Vendor.as_str()))
            .filter(listings::status.eq_any(statuses.clone()))
            .select(count_star())
            .first::<i64>(&mut conn)?;

        let featured = listings::table
            .filter(listings::owner_id.eq(user_id))
            .filter(listings::owner_type.eq(OwnerType::Vendor.as_str()))
            .filter(listings::status.eq_any(statuses))
            .filter(listings::is_featured.eq(true))
            .select(count_star())
            .first::<i64>(&mut conn)?;

        Ok(ListingUsage { total, featured })
    }

    async fn find_by_id(&self, listing_id: Uuid) -> Result<Option<ListingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let listing = listings::table
            .filter(listings::id.eq(listing_id))
            .select(ListingEntity::as_select())
            .first::<ListingEntity>(&mut conn)
            .optional()?;

        Ok(listing)
    }

    async fn insert_listing(
        &self,
        insert_listing_entity: InsertListingEntity,
    ) -> Result<ListingEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let listing = insert_into(listings::table)
            .values(&insert_listing_entity)
            .returning(ListingEntity::as_returning())
            .get_result::<ListingEntity>(&mut conn)?;

        Ok(listing)
    }

    async fn update_featured(&self, listing_id: Uuid, is_featured: bool) -> Result<ListingEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let listing = update(listings::table)
            .filter(listings::id.eq(listing_id))
            .set((
                listings::is_featured.eq(is_featured),
                listings::updated_at.eq(Utc::now()),
            ))
            .returning(ListingEntity::as_returning())
            .get_result::<ListingEntity>(&mut conn)?;

        Ok(listing)
    }
}
