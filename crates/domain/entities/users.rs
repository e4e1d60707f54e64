use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::users;

/// Vendor identity shown next to a subscription.
#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = users)]
pub struct VendorEntity {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
}
