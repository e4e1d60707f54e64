use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::{
        plans::PlanEntity,
        subscriptions::{SubscriptionDetails, SubscriptionWithPlan},
        users::VendorEntity,
    },
    value_objects::{
        enums::{billing_intervals::BillingInterval, plan_statuses::PlanStatus},
        listings::ListingUsage,
        plans::PlanFeatures,
    },
};

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Body of `POST /subscriptions/assign`. Only the plan id is read; start and end dates
/// sent by the client are dropped during deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignPlanModel {
    pub plan_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStateFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl SubscriptionStateFilter {
    pub fn is_active(&self) -> Option<bool> {
        match self {
            SubscriptionStateFilter::All => None,
            SubscriptionStateFilter::Active => Some(true),
            SubscriptionStateFilter::Inactive => Some(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSubscriptionsFilter {
    pub state: SubscriptionStateFilter,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlanDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_minor: i64,
    pub interval: BillingInterval,
    pub features: PlanFeatures,
    pub status: PlanStatus,
}

impl From<PlanEntity> for PlanDto {
    fn from(value: PlanEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            description: value.description,
            price_minor: value.price_minor,
            interval: value.interval,
            features: value.features,
            status: value.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VendorDto {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
}

impl From<VendorEntity> for VendorDto {
    fn from(value: VendorEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            email: value.email,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubscriptionDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub plan: PlanDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<VendorDto>,
}

impl From<SubscriptionWithPlan> for SubscriptionDto {
    fn from(value: SubscriptionWithPlan) -> Self {
        let SubscriptionWithPlan { subscription, plan } = value;
        Self {
            id: subscription.id,
            user_id: subscription.user_id,
            plan_id: subscription.plan_id,
            start_date: subscription.start_date,
            end_date: subscription.end_date,
            is_active: subscription.is_active,
            created_at: subscription.created_at,
            plan: plan.into(),
            vendor: None,
        }
    }
}

impl From<SubscriptionDetails> for SubscriptionDto {
    fn from(value: SubscriptionDetails) -> Self {
        let vendor = value.vendor.into();
        let mut dto = SubscriptionDto::from(SubscriptionWithPlan {
            subscription: value.subscription,
            plan: value.plan,
        });
        dto.vendor = Some(vendor);
        dto
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubscriptionPageDto {
    pub items: Vec<SubscriptionDto>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CurrentEntitlementDto {
    pub subscription: SubscriptionDto,
    pub usage: ListingUsage,
    pub days_remaining: i64,
    /// False when the subscribed plan was retired; entitlement checks deny in that case.
    pub plan_active: bool,
}
