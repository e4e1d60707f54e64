use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::listings::{InsertListingEntity, ListingEntity},
    value_objects::listings::ListingUsage,
};

#[automock]
#[async_trait]
pub trait ListingRepository {
    /// Vendor-owned listings in a quota-counted status; `featured` is the featured subset.
    async fn count_vendor_listings(&self, user_id: Uuid) -> Result<ListingUsage>;
    async fn find_by_id(&self, listing_id: Uuid) -> Result<Option<ListingEntity>>;
    async fn insert_listing(&self, insert_listing_entity: InsertListingEntity)
    -> Result<ListingEntity>;
    async fn update_featured(&self, listing_id: Uuid, is_featured: bool) -> Result<ListingEntity>;
}
