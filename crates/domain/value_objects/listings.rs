use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::listings::ListingEntity,
    value_objects::enums::{listing_statuses::ListingStatus, owner_types::OwnerType},
};

/// Listings currently occupying a vendor's quota.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingUsage {
    pub total: i64,
    pub featured: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateListingModel {
    pub title: String,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub is_featured: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateListingFeaturedModel {
    pub is_featured: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ListingDto {
    pub id: Uuid,
    pub title: String,
    pub category_id: Option<Uuid>,
    pub owner_id: Uuid,
    pub owner_type: Option<OwnerType>,
    pub is_featured: bool,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ListingEntity> for ListingDto {
    fn from(value: ListingEntity) -> Self {
        Self {
            id: value.id,
            title: value.title,
            category_id: value.category_id,
            owner_id: value.owner_id,
            owner_type: OwnerType::from_str(&value.owner_type),
            is_featured: value.is_featured,
            status: ListingStatus::from_str(&value.status),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}
