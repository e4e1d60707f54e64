use std::sync::Arc;

use chrono::Utc;
use crates::domain::{
    entities::plans::PlanEntity,
    repositories::{listings::ListingRepository, subscriptions::SubscriptionRepository},
    value_objects::{
        entitlements::{Decision, DenyReason},
        listings::ListingUsage,
        plans::{Quota, featured_quota, listing_quota},
    },
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Decides whether a vendor may create or feature a listing under their current plan.
///
/// Every call re-reads the subscription, plan and usage; nothing is cached. Storage
/// failures deny the action. Administrators are expected to skip this check entirely.
pub struct EntitlementValidator<S, L>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    L: ListingRepository + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
    listing_repo: Arc<L>,
}

impl<S, L> EntitlementValidator<S, L>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    L: ListingRepository + Send + Sync + 'static,
{
    pub fn new(subscription_repo: Arc<S>, listing_repo: Arc<L>) -> Self {
        Self {
            subscription_repo,
            listing_repo,
        }
    }

    pub async fn validate_create(&self, user_id: Uuid, is_featured: bool) -> Decision {
        info!(%user_id, is_featured, "entitlements: validating listing creation");

        let plan = match self.resolve_active_plan(user_id).await {
            Ok(plan) => plan,
            Err(reason) => return deny(user_id, reason),
        };

        let max_listings = listing_quota(Some(&plan));
        let max_featured = featured_quota(Some(&plan));

        let usage = match self.current_usage(user_id).await {
            Ok(usage) => usage,
            Err(reason) => return deny(user_id, reason),
        };

        debug!(
            %user_id,
            plan_id = %plan.id,
            ?max_listings,
            ?max_featured,
            current_total = usage.total,
            current_featured = usage.featured,
            "entitlements: quota snapshot"
        );

        // A listing that cannot exist at all reports that before the featured limit.
        if let Quota::Limited(limit) = max_listings {
            if usage.total >= limit {
                return deny(user_id, DenyReason::ListingLimitReached(limit));
            }
        }

        if is_featured {
            if let Err(reason) = check_featured(max_featured, &usage) {
                return deny(user_id, reason);
            }
        }

        Decision::Allow
    }

    pub async fn validate_update(
        &self,
        user_id: Uuid,
        current_is_featured: bool,
        new_is_featured: bool,
    ) -> Decision {
        if current_is_featured == new_is_featured {
            debug!(%user_id, "entitlements: featured flag unchanged");
            return Decision::Allow;
        }

        if current_is_featured && !new_is_featured {
            debug!(%user_id, "entitlements: un-featuring never needs a plan");
            return Decision::Allow;
        }

        info!(%user_id, "entitlements: validating featured upgrade");

        let plan = match self.resolve_active_plan(user_id).await {
            Ok(plan) => plan,
            Err(reason) => return deny(user_id, reason),
        };

        let usage = match self.current_usage(user_id).await {
            Ok(usage) => usage,
            Err(reason) => return deny(user_id, reason),
        };

        match check_featured(featured_quota(Some(&plan)), &usage) {
            Ok(()) => Decision::Allow,
            Err(reason) => deny(user_id, reason),
        }
    }

    async fn resolve_active_plan(&self, user_id: Uuid) -> Result<PlanEntity, DenyReason> {
        let current = self
            .subscription_repo
            .find_active_subscription(user_id, Utc::now())
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "entitlements: failed to load active subscription"
                );
                DenyReason::StorageError(err.to_string())
            })?;

        let Some(current) = current else {
            return Err(DenyReason::NoActivePlan);
        };

        if !current.plan.status.is_active() {
            debug!(
                %user_id,
                plan_id = %current.plan.id,
                plan_status = %current.plan.status,
                "entitlements: subscribed plan is not active"
            );
            return Err(DenyReason::PlanInactive);
        }

        Ok(current.plan)
    }

    async fn current_usage(&self, user_id: Uuid) -> Result<ListingUsage, DenyReason> {
        self.listing_repo
            .count_vendor_listings(user_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "entitlements: failed to count vendor listings"
                );
                DenyReason::StorageError(err.to_string())
            })
    }
}

fn check_featured(max_featured: Quota, usage: &ListingUsage) -> Result<(), DenyReason> {
    match max_featured {
        Quota::Limited(limit) if usage.featured >= limit => {
            Err(DenyReason::FeaturedLimitReached(limit))
        }
        _ => Ok(()),
    }
}

fn deny(user_id: Uuid, reason: DenyReason) -> Decision {
    warn!(
        %user_id,
        reason = %reason,
        "entitlements: action denied"
    );
    Decision::Deny(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use chrono::Duration;
    use crates::domain::{
        entities::subscriptions::{SubscriptionEntity, SubscriptionWithPlan},
        repositories::{
            listings::MockListingRepository, subscriptions::MockSubscriptionRepository,
        },
        value_objects::{
            enums::{billing_intervals::BillingInterval, plan_statuses::PlanStatus},
            plans::{FeaturesRaw, PlanFeatures},
        },
    };
    use mockall::predicate::{always, eq};
    use serde_json::{Value, json};

    fn sample_plan(features: Value, status: PlanStatus) -> PlanEntity {
        PlanEntity {
            id: Uuid::new_v4(),
            name: "Basic Plan".to_string(),
            description: None,
            price_minor: 49_900,
            interval: BillingInterval::Monthly,
            features: PlanFeatures::parse(FeaturesRaw::from_column(Some(features)).as_ref()),
            status,
        }
    }

    fn active_subscription(user_id: Uuid, plan: PlanEntity) -> SubscriptionWithPlan {
        let now = Utc::now();
        SubscriptionWithPlan {
            subscription: SubscriptionEntity {
                id: Uuid::new_v4(),
                user_id,
                plan_id: plan.id,
                start_date: now - Duration::days(3),
                end_date: now + Duration::days(27),
                is_active: true,
                created_at: now - Duration::days(3),
                updated_at: now - Duration::days(3),
            },
            plan,
        }
    }

    fn subscription_repo_with(
        user_id: Uuid,
        current: Option<SubscriptionWithPlan>,
    ) -> MockSubscriptionRepository {
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_active_subscription()
            .with(eq(user_id), always())
            .times(1)
            .returning(move |_, _| Ok(current.clone()));
        subscription_repo
    }

    fn listing_repo_with(user_id: Uuid, total: i64, featured: i64) -> MockListingRepository {
        let mut listing_repo = MockListingRepository::new();
        listing_repo
            .expect_count_vendor_listings()
            .with(eq(user_id))
            .times(1)
            .returning(move |_| Ok(ListingUsage { total, featured }));
        listing_repo
    }

    fn validator(
        subscription_repo: MockSubscriptionRepository,
        listing_repo: MockListingRepository,
    ) -> EntitlementValidator<MockSubscriptionRepository, MockListingRepository> {
        EntitlementValidator::new(Arc::new(subscription_repo), Arc::new(listing_repo))
    }

    #[tokio::test]
    async fn create_denied_when_listing_limit_reached() {
        let user_id = Uuid::new_v4();
        let plan = sample_plan(json!({ "listings": 5, "featured": 1 }), PlanStatus::Active);

        let decision = validator(
            subscription_repo_with(user_id, Some(active_subscription(user_id, plan))),
            listing_repo_with(user_id, 5, 0),
        )
        .validate_create(user_id, false)
        .await;

        assert_eq!(decision, Decision::Deny(DenyReason::ListingLimitReached(5)));
    }

    #[tokio::test]
    async fn create_allowed_one_below_listing_limit() {
        let user_id = Uuid::new_v4();
        let plan = sample_plan(json!({ "listings": 5, "featured": 1 }), PlanStatus::Active);

        let decision = validator(
            subscription_repo_with(user_id, Some(active_subscription(user_id, plan))),
            listing_repo_with(user_id, 4, 0),
        )
        .validate_create(user_id, false)
        .await;

        assert_eq!(decision, Decision::Allow);
    }

    #[tokio::test]
    async fn listing_limit_is_reported_before_featured_limit() {
        let user_id = Uuid::new_v4();
        let plan = sample_plan(json!({ "listings": 3, "featured": 1 }), PlanStatus::Active);

        let decision = validator(
            subscription_repo_with(user_id, Some(active_subscription(user_id, plan))),
            listing_repo_with(user_id, 3, 1),
        )
        .validate_create(user_id, true)
        .await;

        assert_eq!(decision, Decision::Deny(DenyReason::ListingLimitReached(3)));
    }

    #[tokio::test]
    async fn featured_create_denied_at_featured_limit() {
        let user_id = Uuid::new_v4();
        let plan = sample_plan(json!({ "listings": "25", "featured": "2" }), PlanStatus::Active);

        let decision = validator(
            subscription_repo_with(user_id, Some(active_subscription(user_id, plan))),
            listing_repo_with(user_id, 4, 2),
        )
        .validate_create(user_id, true)
        .await;

        assert_eq!(decision, Decision::Deny(DenyReason::FeaturedLimitReached(2)));
    }

    #[tokio::test]
    async fn unlimited_featured_always_allows_within_total() {
        let user_id = Uuid::new_v4();
        let plan = sample_plan(
            json!({ "listings": "unlimited", "featured": "unlimited" }),
            PlanStatus::Active,
        );

        let decision = validator(
            subscription_repo_with(user_id, Some(active_subscription(user_id, plan))),
            listing_repo_with(user_id, 10_000, 9_999),
        )
        .validate_create(user_id, true)
        .await;

        assert_eq!(decision, Decision::Allow);
    }

    #[tokio::test]
    async fn regular_create_ignores_featured_quota() {
        let user_id = Uuid::new_v4();
        let plan = sample_plan(json!({ "listings": 5 }), PlanStatus::Active);

        let decision = validator(
            subscription_repo_with(user_id, Some(active_subscription(user_id, plan))),
            listing_repo_with(user_id, 1, 0),
        )
        .validate_create(user_id, false)
        .await;

        assert_eq!(decision, Decision::Allow);
    }

    #[tokio::test]
    async fn create_denied_without_active_plan_and_skips_usage() {
        let user_id = Uuid::new_v4();
        let mut listing_repo = MockListingRepository::new();
        listing_repo.expect_count_vendor_listings().never();

        let decision = validator(subscription_repo_with(user_id, None), listing_repo)
            .validate_create(user_id, false)
            .await;

        assert_eq!(decision, Decision::Deny(DenyReason::NoActivePlan));
    }

    #[tokio::test]
    async fn create_denied_when_subscribed_plan_is_inactive() {
        let user_id = Uuid::new_v4();
        let plan = sample_plan(json!({ "listings": 50 }), PlanStatus::Draft);
        let mut listing_repo = MockListingRepository::new();
        listing_repo.expect_count_vendor_listings().never();

        let decision = validator(
            subscription_repo_with(user_id, Some(active_subscription(user_id, plan))),
            listing_repo,
        )
        .validate_create(user_id, false)
        .await;

        assert_eq!(decision, Decision::Deny(DenyReason::PlanInactive));
    }

    #[tokio::test]
    async fn malformed_features_fail_closed() {
        let user_id = Uuid::new_v4();
        let plan = sample_plan(Value::String("{not json".to_string()), PlanStatus::Active);

        let decision = validator(
            subscription_repo_with(user_id, Some(active_subscription(user_id, plan))),
            listing_repo_with(user_id, 0, 0),
        )
        .validate_create(user_id, false)
        .await;

        assert_eq!(decision, Decision::Deny(DenyReason::ListingLimitReached(0)));
    }

    #[tokio::test]
    async fn subscription_storage_error_denies() {
        let user_id = Uuid::new_v4();
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_active_subscription()
            .returning(|_, _| Err(anyhow!("connection refused")));
        let mut listing_repo = MockListingRepository::new();
        listing_repo.expect_count_vendor_listings().never();

        let decision = validator(subscription_repo, listing_repo)
            .validate_create(user_id, true)
            .await;

        assert!(matches!(
            decision,
            Decision::Deny(DenyReason::StorageError(detail)) if detail.contains("connection refused")
        ));
    }

    #[tokio::test]
    async fn usage_storage_error_denies() {
        let user_id = Uuid::new_v4();
        let plan = sample_plan(json!({ "listings": "unlimited" }), PlanStatus::Active);
        let mut listing_repo = MockListingRepository::new();
        listing_repo
            .expect_count_vendor_listings()
            .returning(|_| Err(anyhow!("statement timeout")));

        let decision = validator(
            subscription_repo_with(user_id, Some(active_subscription(user_id, plan))),
            listing_repo,
        )
        .validate_create(user_id, false)
        .await;

        assert!(matches!(
            decision,
            Decision::Deny(DenyReason::StorageError(_))
        ));
    }

    #[tokio::test]
    async fn unchanged_featured_flag_is_a_no_op_without_reads() {
        let user_id = Uuid::new_v4();

        for flag in [false, true] {
            let mut subscription_repo = MockSubscriptionRepository::new();
            subscription_repo.expect_find_active_subscription().never();
            let mut listing_repo = MockListingRepository::new();
            listing_repo.expect_count_vendor_listings().never();

            let decision = validator(subscription_repo, listing_repo)
                .validate_update(user_id, flag, flag)
                .await;

            assert_eq!(decision, Decision::Allow);
        }
    }

    #[tokio::test]
    async fn unfeaturing_never_depends_on_plan_state() {
        let user_id = Uuid::new_v4();
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo.expect_find_active_subscription().never();
        let mut listing_repo = MockListingRepository::new();
        listing_repo.expect_count_vendor_listings().never();

        let decision = validator(subscription_repo, listing_repo)
            .validate_update(user_id, true, false)
            .await;

        assert_eq!(decision, Decision::Allow);
    }

    #[tokio::test]
    async fn featuring_denied_at_featured_limit() {
        let user_id = Uuid::new_v4();
        let plan = sample_plan(json!({ "listings": 5, "featured": 1 }), PlanStatus::Active);

        let decision = validator(
            subscription_repo_with(user_id, Some(active_subscription(user_id, plan))),
            listing_repo_with(user_id, 2, 1),
        )
        .validate_update(user_id, false, true)
        .await;

        assert_eq!(decision, Decision::Deny(DenyReason::FeaturedLimitReached(1)));
    }

    #[tokio::test]
    async fn featuring_ignores_total_listing_quota() {
        let user_id = Uuid::new_v4();
        let plan = sample_plan(json!({ "listings": 2, "featured": 3 }), PlanStatus::Active);

        let decision = validator(
            subscription_repo_with(user_id, Some(active_subscription(user_id, plan))),
            listing_repo_with(user_id, 2, 1),
        )
        .validate_update(user_id, false, true)
        .await;

        assert_eq!(decision, Decision::Allow);
    }

    #[tokio::test]
    async fn featuring_requires_active_plan() {
        let user_id = Uuid::new_v4();
        let mut listing_repo = MockListingRepository::new();
        listing_repo.expect_count_vendor_listings().never();

        let decision = validator(subscription_repo_with(user_id, None), listing_repo)
            .validate_update(user_id, false, true)
            .await;

        assert_eq!(decision, Decision::Deny(DenyReason::NoActivePlan));
    }
}
