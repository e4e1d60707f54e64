use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::listings;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = listings)]
pub struct ListingEntity {
    pub id: Uuid,
    pub title: String,
    pub category_id: Option<Uuid>,
    pub owner_id: Uuid,
    pub owner_type: String,
    pub is_featured: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = listings)]
pub struct InsertListingEntity {
    pub title: String,
    pub category_id: Option<Uuid>,
    pub owner_id: Uuid,
    pub owner_type: String,
    pub is_featured: bool,
    pub status: String,
}
