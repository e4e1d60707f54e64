use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::{
        enums::{billing_intervals::BillingInterval, plan_statuses::PlanStatus},
        plans::{FeaturesRaw, PlanFeatures},
    },
    infra::db::postgres::schema::plans,
};

#[derive(Debug, Clone, PartialEq)]
pub struct PlanEntity {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_minor: i64,
    pub interval: BillingInterval,
    pub features: PlanFeatures,
    pub status: PlanStatus,
}

/// Raw row used for Diesel queries. Features stay as JSON and are parsed into PlanFeatures.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = plans)]
pub struct PlanRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_minor: i64,
    pub billing_interval: String,
    pub features: Option<serde_json::Value>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PlanRow> for PlanEntity {
    fn from(value: PlanRow) -> Self {
        let raw_features = FeaturesRaw::from_column(value.features);

        Self {
            id: value.id,
            name: value.name,
            description: value.description,
            price_minor: value.price_minor,
            interval: BillingInterval::from_str_or_monthly(&value.billing_interval),
            features: PlanFeatures::parse(raw_features.as_ref()),
            status: PlanStatus::from_str(&value.status),
        }
    }
}
