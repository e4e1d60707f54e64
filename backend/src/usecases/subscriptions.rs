use std::sync::Arc;

use chrono::Utc;
use crates::domain::{
    entities::subscriptions::{InsertSubscriptionEntity, SubscriptionWithPlan},
    repositories::{
        listings::ListingRepository, plans::PlanRepository,
        subscriptions::SubscriptionRepository,
    },
    value_objects::{
        billing_periods::{self, BillingPeriodError},
        subscriptions::{
            CurrentEntitlementDto, DEFAULT_PAGE_LIMIT, ListSubscriptionsFilter, MAX_PAGE_LIMIT,
            PlanDto, SubscriptionDto, SubscriptionPageDto, SubscriptionStateFilter,
        },
    },
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("This plan is not available for subscription")]
    PlanInactive,
    #[error("You already have an active subscription to this plan")]
    AlreadySubscribed,
    #[error("This subscription is already inactive")]
    AlreadyInactive,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl SubscriptionError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            SubscriptionError::InvalidInput(_) | SubscriptionError::PlanInactive => {
                StatusCode::BAD_REQUEST
            }
            SubscriptionError::NotFound(_) => StatusCode::NOT_FOUND,
            SubscriptionError::AlreadySubscribed | SubscriptionError::AlreadyInactive => {
                StatusCode::CONFLICT
            }
            SubscriptionError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<BillingPeriodError> for SubscriptionError {
    fn from(value: BillingPeriodError) -> Self {
        match value {
            BillingPeriodError::InvalidInput(detail) => SubscriptionError::InvalidInput(detail),
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, SubscriptionError>;

/// Vendor self-service subscription lifecycle: assign, cancel, list.
pub struct SubscriptionUseCase<P, S, L>
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    L: ListingRepository + Send + Sync + 'static,
{
    plan_repo: Arc<P>,
    subscription_repo: Arc<S>,
    listing_repo: Arc<L>,
}

impl<P, S, L> SubscriptionUseCase<P, S, L>
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    L: ListingRepository + Send + Sync + 'static,
{
    pub fn new(plan_repo: Arc<P>, subscription_repo: Arc<S>, listing_repo: Arc<L>) -> Self {
        Self {
            plan_repo,
            subscription_repo,
            listing_repo,
        }
    }

    pub async fn list_plans(&self) -> UseCaseResult<Vec<PlanDto>> {
        info!("subscriptions: listing active plans");
        let plans = self.plan_repo.list_active_plans().await.map_err(|err| {
            error!(db_error = ?err, "subscriptions: failed to list active plans");
            SubscriptionError::Storage(err)
        })?;
        let plan_count = plans.len();
        info!(plan_count, "subscriptions: active plans loaded");
        Ok(plans.into_iter().map(PlanDto::from).collect())
    }

    /// Subscribes the vendor to a plan starting now. The period end is always derived
    /// from the plan interval; callers cannot supply either date.
    pub async fn assign_plan(&self, user_id: Uuid, plan_id: &str) -> UseCaseResult<SubscriptionDto> {
        info!(%user_id, plan_id, "subscriptions: assign plan requested");

        let plan_id = Uuid::parse_str(plan_id.trim()).map_err(|_| {
            let err = SubscriptionError::InvalidInput("plan_id must be a valid UUID".to_string());
            warn!(
                %user_id,
                status = err.status_code().as_u16(),
                "subscriptions: malformed plan id"
            );
            err
        })?;

        let plan = self
            .plan_repo
            .find_by_id(plan_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    %plan_id,
                    db_error = ?err,
                    "subscriptions: failed to load plan"
                );
                SubscriptionError::Storage(err)
            })?
            .ok_or(SubscriptionError::NotFound("plan"))?;

        if !plan.status.is_active() {
            warn!(
                %user_id,
                %plan_id,
                plan_status = %plan.status,
                "subscriptions: plan is not open for subscription"
            );
            return Err(SubscriptionError::PlanInactive);
        }

        let existing = self
            .subscription_repo
            .find_active_for_plan(user_id, plan_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    %plan_id,
                    db_error = ?err,
                    "subscriptions: failed to check existing subscription"
                );
                SubscriptionError::Storage(err)
            })?;

        if let Some(existing) = existing {
            warn!(
                %user_id,
                %plan_id,
                subscription_id = %existing.id,
                "subscriptions: already subscribed to plan"
            );
            return Err(SubscriptionError::AlreadySubscribed);
        }

        let start_date = Utc::now();
        let end_date = billing_periods::compute_end_date(start_date, plan.interval)?;

        let inserted = self
            .subscription_repo
            .insert_subscription(InsertSubscriptionEntity {
                user_id,
                plan_id,
                start_date,
                end_date,
                is_active: true,
            })
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    %plan_id,
                    db_error = ?err,
                    "subscriptions: failed to insert subscription"
                );
                SubscriptionError::Storage(err)
            })?;

        // A concurrent assign for the same pair won the unique index.
        let Some(subscription) = inserted else {
            warn!(
                %user_id,
                %plan_id,
                "subscriptions: duplicate active subscription rejected by storage"
            );
            return Err(SubscriptionError::AlreadySubscribed);
        };

        info!(
            %user_id,
            %plan_id,
            subscription_id = %subscription.id,
            %end_date,
            interval = %plan.interval,
            "subscriptions: plan assigned"
        );

        let details = self
            .subscription_repo
            .find_details(subscription.id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    subscription_id = %subscription.id,
                    db_error = ?err,
                    "subscriptions: failed to load subscription details"
                );
                SubscriptionError::Storage(err)
            })?;

        match details {
            Some(details) => Ok(details.into()),
            None => {
                warn!(
                    %user_id,
                    subscription_id = %subscription.id,
                    "subscriptions: vendor record missing, returning subscription without it"
                );
                Ok(SubscriptionDto::from(SubscriptionWithPlan {
                    subscription,
                    plan,
                }))
            }
        }
    }

    /// Deactivates one of the vendor's subscriptions. The end date is kept as history.
    pub async fn cancel_subscription(
        &self,
        user_id: Uuid,
        subscription_id: Uuid,
    ) -> UseCaseResult<SubscriptionDto> {
        info!(%user_id, %subscription_id, "subscriptions: cancel requested");

        let subscription = self
            .subscription_repo
            .find_by_id_for_user(user_id, subscription_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    %subscription_id,
                    db_error = ?err,
                    "subscriptions: failed to load subscription"
                );
                SubscriptionError::Storage(err)
            })?
            .ok_or(SubscriptionError::NotFound("subscription"))?;

        if !subscription.is_active {
            info!(
                %user_id,
                %subscription_id,
                "subscriptions: subscription already inactive"
            );
            return Err(SubscriptionError::AlreadyInactive);
        }

        let plan = self
            .plan_repo
            .find_by_id(subscription.plan_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    plan_id = %subscription.plan_id,
                    db_error = ?err,
                    "subscriptions: failed to load plan of subscription"
                );
                SubscriptionError::Storage(err)
            })?
            .ok_or(SubscriptionError::NotFound("plan"))?;

        let updated = self
            .subscription_repo
            .update_subscription_active(subscription.id, false)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    %subscription_id,
                    db_error = ?err,
                    "subscriptions: failed to deactivate subscription"
                );
                SubscriptionError::Storage(err)
            })?;

        info!(%user_id, %subscription_id, "subscriptions: subscription canceled");

        Ok(SubscriptionDto::from(SubscriptionWithPlan {
            subscription: updated,
            plan,
        }))
    }

    pub async fn list_subscriptions(
        &self,
        user_id: Uuid,
        state: SubscriptionStateFilter,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> UseCaseResult<SubscriptionPageDto> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);

        if page < 1 {
            return Err(SubscriptionError::InvalidInput(
                "page must be a positive number".to_string(),
            ));
        }
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(SubscriptionError::InvalidInput(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_LIMIT
            )));
        }

        let filter = ListSubscriptionsFilter {
            state,
            limit,
            offset: (page - 1).saturating_mul(limit),
        };

        info!(%user_id, ?state, page, limit, "subscriptions: listing subscriptions");

        let items = self
            .subscription_repo
            .list_subscriptions(user_id, filter.clone())
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "subscriptions: failed to list subscriptions");
                SubscriptionError::Storage(err)
            })?;

        let total = self
            .subscription_repo
            .count_subscriptions(user_id, filter)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "subscriptions: failed to count subscriptions");
                SubscriptionError::Storage(err)
            })?;

        Ok(SubscriptionPageDto {
            items: items.into_iter().map(SubscriptionDto::from).collect(),
            page,
            limit,
            total,
        })
    }

    /// The subscription entitlement checks would use right now, with usage and time left.
    pub async fn current_entitlement(
        &self,
        user_id: Uuid,
    ) -> UseCaseResult<Option<CurrentEntitlementDto>> {
        info!(%user_id, "subscriptions: loading current entitlement");
        let now = Utc::now();

        let Some(current) = self
            .subscription_repo
            .find_active_subscription(user_id, now)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "subscriptions: failed to load current subscription"
                );
                SubscriptionError::Storage(err)
            })?
        else {
            info!(%user_id, "subscriptions: no active subscription");
            return Ok(None);
        };

        let usage = self
            .listing_repo
            .count_vendor_listings(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "subscriptions: failed to count listings");
                SubscriptionError::Storage(err)
            })?;

        let days_remaining = billing_periods::days_remaining(current.subscription.end_date, now);
        let plan_active = current.plan.status.is_active();
        if !plan_active {
            info!(
                %user_id,
                plan_id = %current.plan.id,
                plan_status = %current.plan.status,
                "subscriptions: current plan is no longer active"
            );
        }

        Ok(Some(CurrentEntitlementDto {
            subscription: current.into(),
            usage,
            days_remaining,
            plan_active,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use chrono::{DateTime, Duration, Months};
    use crates::domain::{
        entities::{
            plans::PlanEntity,
            subscriptions::{SubscriptionDetails, SubscriptionEntity},
            users::VendorEntity,
        },
        repositories::{
            listings::MockListingRepository, plans::MockPlanRepository,
            subscriptions::MockSubscriptionRepository,
        },
        value_objects::{
            enums::{billing_intervals::BillingInterval, plan_statuses::PlanStatus},
            listings::ListingUsage,
            plans::PlanFeatures,
        },
    };
    use mockall::predicate::{always, eq};
    use std::sync::Mutex;

    fn sample_plan(id: Uuid, interval: BillingInterval, status: PlanStatus) -> PlanEntity {
        PlanEntity {
            id,
            name: "Basic Plan".to_string(),
            description: Some("5 listings, 1 featured".to_string()),
            price_minor: 49_900,
            interval,
            features: PlanFeatures::default(),
            status,
        }
    }

    fn row_from(insert: &InsertSubscriptionEntity) -> SubscriptionEntity {
        SubscriptionEntity {
            id: Uuid::new_v4(),
            user_id: insert.user_id,
            plan_id: insert.plan_id,
            start_date: insert.start_date,
            end_date: insert.end_date,
            is_active: insert.is_active,
            created_at: insert.start_date,
            updated_at: insert.start_date,
        }
    }

    fn sample_subscription(user_id: Uuid, plan_id: Uuid, is_active: bool) -> SubscriptionEntity {
        let now = Utc::now();
        SubscriptionEntity {
            id: Uuid::new_v4(),
            user_id,
            plan_id,
            start_date: now - Duration::days(10),
            end_date: now + Duration::days(20),
            is_active,
            created_at: now - Duration::days(10),
            updated_at: now - Duration::days(10),
        }
    }

    fn usecase(
        plan_repo: MockPlanRepository,
        subscription_repo: MockSubscriptionRepository,
    ) -> SubscriptionUseCase<MockPlanRepository, MockSubscriptionRepository, MockListingRepository>
    {
        SubscriptionUseCase::new(
            Arc::new(plan_repo),
            Arc::new(subscription_repo),
            Arc::new(MockListingRepository::new()),
        )
    }

    fn plan_repo_returning(plan: Option<PlanEntity>) -> MockPlanRepository {
        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_by_id()
            .returning(move |_| Ok(plan.clone()));
        plan_repo
    }

    #[tokio::test]
    async fn assign_rejects_malformed_plan_id_without_reads() {
        let mut plan_repo = MockPlanRepository::new();
        plan_repo.expect_find_by_id().never();

        let err = usecase(plan_repo, MockSubscriptionRepository::new())
            .assign_plan(Uuid::new_v4(), "not-a-uuid")
            .await
            .unwrap_err();

        assert!(matches!(err, SubscriptionError::InvalidInput(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn assign_fails_for_missing_plan() {
        let err = usecase(plan_repo_returning(None), MockSubscriptionRepository::new())
            .assign_plan(Uuid::new_v4(), &Uuid::new_v4().to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, SubscriptionError::NotFound("plan")));
        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn assign_fails_for_inactive_plan() {
        let plan_id = Uuid::new_v4();
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo.expect_insert_subscription().never();

        let err = usecase(
            plan_repo_returning(Some(sample_plan(
                plan_id,
                BillingInterval::Monthly,
                PlanStatus::Inactive,
            ))),
            subscription_repo,
        )
        .assign_plan(Uuid::new_v4(), &plan_id.to_string())
        .await
        .unwrap_err();

        assert!(matches!(err, SubscriptionError::PlanInactive));
    }

    #[tokio::test]
    async fn assign_starts_now_and_derives_end_from_interval() {
        let user_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let plan = sample_plan(plan_id, BillingInterval::Quarterly, PlanStatus::Active);
        let inserted: Arc<Mutex<Option<InsertSubscriptionEntity>>> = Arc::new(Mutex::new(None));

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_active_for_plan()
            .with(eq(user_id), eq(plan_id))
            .times(1)
            .returning(|_, _| Ok(None));
        let captured = Arc::clone(&inserted);
        subscription_repo
            .expect_insert_subscription()
            .times(1)
            .returning(move |insert| {
                *captured.lock().unwrap() = Some(insert.clone());
                Ok(Some(row_from(&insert)))
            });
        let details_plan = plan.clone();
        subscription_repo
            .expect_find_details()
            .times(1)
            .returning(move |subscription_id| {
                let mut subscription = sample_subscription(user_id, plan_id, true);
                subscription.id = subscription_id;
                Ok(Some(SubscriptionDetails {
                    subscription,
                    plan: details_plan.clone(),
                    vendor: VendorEntity {
                        id: user_id,
                        name: Some("Acme Rentals".to_string()),
                        email: "owner@acme.test".to_string(),
                    },
                }))
            });

        let before = Utc::now();
        let dto = usecase(plan_repo_returning(Some(plan)), subscription_repo)
            .assign_plan(user_id, &format!(" {} ", plan_id))
            .await
            .unwrap();
        let after = Utc::now();

        let insert = inserted.lock().unwrap().clone().unwrap();
        assert!(insert.is_active);
        assert!(insert.start_date >= before && insert.start_date <= after);
        assert_eq!(
            insert.end_date,
            insert.start_date.checked_add_months(Months::new(3)).unwrap()
        );
        assert_eq!(dto.vendor.unwrap().email, "owner@acme.test");
    }

    #[tokio::test]
    async fn assign_twice_reports_already_subscribed() {
        let user_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_active_for_plan()
            .returning(move |user_id, plan_id| {
                Ok(Some(sample_subscription(user_id, plan_id, true)))
            });
        subscription_repo.expect_insert_subscription().never();

        let err = usecase(
            plan_repo_returning(Some(sample_plan(
                plan_id,
                BillingInterval::Monthly,
                PlanStatus::Active,
            ))),
            subscription_repo,
        )
        .assign_plan(user_id, &plan_id.to_string())
        .await
        .unwrap_err();

        assert!(matches!(err, SubscriptionError::AlreadySubscribed));
        assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn assign_losing_insert_race_reports_already_subscribed() {
        let plan_id = Uuid::new_v4();
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_active_for_plan()
            .returning(|_, _| Ok(None));
        subscription_repo
            .expect_insert_subscription()
            .times(1)
            .returning(|_| Ok(None));
        subscription_repo.expect_find_details().never();

        let err = usecase(
            plan_repo_returning(Some(sample_plan(
                plan_id,
                BillingInterval::Yearly,
                PlanStatus::Active,
            ))),
            subscription_repo,
        )
        .assign_plan(Uuid::new_v4(), &plan_id.to_string())
        .await
        .unwrap_err();

        assert!(matches!(err, SubscriptionError::AlreadySubscribed));
    }

    #[tokio::test]
    async fn assign_surfaces_storage_errors() {
        let plan_id = Uuid::new_v4();
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_active_for_plan()
            .returning(|_, _| Err(anyhow!("pool timed out")));

        let err = usecase(
            plan_repo_returning(Some(sample_plan(
                plan_id,
                BillingInterval::Monthly,
                PlanStatus::Active,
            ))),
            subscription_repo,
        )
        .assign_plan(Uuid::new_v4(), &plan_id.to_string())
        .await
        .unwrap_err();

        assert!(matches!(err, SubscriptionError::Storage(_)));
        assert_eq!(
            err.status_code(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn cancel_unknown_subscription_is_not_found() {
        let user_id = Uuid::new_v4();
        let subscription_id = Uuid::new_v4();
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_by_id_for_user()
            .with(eq(user_id), eq(subscription_id))
            .returning(|_, _| Ok(None));
        subscription_repo.expect_update_subscription_active().never();

        let err = usecase(MockPlanRepository::new(), subscription_repo)
            .cancel_subscription(user_id, subscription_id)
            .await
            .unwrap_err();

        assert!(matches!(err, SubscriptionError::NotFound("subscription")));
    }

    #[tokio::test]
    async fn cancel_inactive_subscription_signals_already_inactive() {
        let user_id = Uuid::new_v4();
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_by_id_for_user()
            .returning(move |user_id, _| Ok(Some(sample_subscription(user_id, Uuid::new_v4(), false))));
        subscription_repo.expect_update_subscription_active().never();

        let err = usecase(MockPlanRepository::new(), subscription_repo)
            .cancel_subscription(user_id, Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, SubscriptionError::AlreadyInactive));
    }

    #[tokio::test]
    async fn cancel_flips_flag_and_keeps_end_date() {
        let user_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let existing = sample_subscription(user_id, plan_id, true);
        let original_end = existing.end_date;
        let subscription_id = existing.id;

        let mut subscription_repo = MockSubscriptionRepository::new();
        let found = existing.clone();
        subscription_repo
            .expect_find_by_id_for_user()
            .returning(move |_, _| Ok(Some(found.clone())));
        subscription_repo
            .expect_update_subscription_active()
            .with(eq(subscription_id), eq(false))
            .times(1)
            .returning(move |_, is_active| {
                let mut updated = existing.clone();
                updated.is_active = is_active;
                Ok(updated)
            });

        let dto = usecase(
            plan_repo_returning(Some(sample_plan(
                plan_id,
                BillingInterval::Monthly,
                PlanStatus::Active,
            ))),
            subscription_repo,
        )
        .cancel_subscription(user_id, subscription_id)
        .await
        .unwrap();

        assert!(!dto.is_active);
        assert_eq!(dto.end_date, original_end);
    }

    #[tokio::test]
    async fn list_paginates_with_offset() {
        let user_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let expected_filter = ListSubscriptionsFilter {
            state: SubscriptionStateFilter::Active,
            limit: 10,
            offset: 20,
        };

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_list_subscriptions()
            .with(eq(user_id), eq(expected_filter.clone()))
            .returning(move |user_id, _| {
                Ok(vec![SubscriptionWithPlan {
                    subscription: sample_subscription(user_id, plan_id, true),
                    plan: sample_plan(plan_id, BillingInterval::Monthly, PlanStatus::Active),
                }])
            });
        subscription_repo
            .expect_count_subscriptions()
            .with(eq(user_id), eq(expected_filter))
            .returning(|_, _| Ok(21));

        let page = usecase(MockPlanRepository::new(), subscription_repo)
            .list_subscriptions(user_id, SubscriptionStateFilter::Active, Some(3), Some(10))
            .await
            .unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.page, 3);
        assert_eq!(page.total, 21);
    }

    #[tokio::test]
    async fn list_rejects_out_of_range_paging() {
        let uc = usecase(MockPlanRepository::new(), MockSubscriptionRepository::new());

        let err = uc
            .list_subscriptions(Uuid::new_v4(), SubscriptionStateFilter::All, Some(0), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SubscriptionError::InvalidInput(_)));

        let err = uc
            .list_subscriptions(
                Uuid::new_v4(),
                SubscriptionStateFilter::All,
                None,
                Some(MAX_PAGE_LIMIT + 1),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SubscriptionError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn current_entitlement_reports_usage_and_days_left() {
        let user_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_active_subscription()
            .with(eq(user_id), always())
            .returning(move |user_id, now: DateTime<Utc>| {
                let mut subscription = sample_subscription(user_id, plan_id, true);
                subscription.end_date = now + Duration::days(5) - Duration::hours(1);
                Ok(Some(SubscriptionWithPlan {
                    subscription,
                    plan: sample_plan(plan_id, BillingInterval::Monthly, PlanStatus::Active),
                }))
            });
        let mut listing_repo = MockListingRepository::new();
        listing_repo
            .expect_count_vendor_listings()
            .returning(|_| Ok(ListingUsage { total: 3, featured: 1 }));

        let snapshot = SubscriptionUseCase::new(
            Arc::new(MockPlanRepository::new()),
            Arc::new(subscription_repo),
            Arc::new(listing_repo),
        )
        .current_entitlement(user_id)
        .await
        .unwrap()
        .unwrap();

        assert_eq!(snapshot.usage, ListingUsage { total: 3, featured: 1 });
        assert_eq!(snapshot.days_remaining, 5);
        assert!(snapshot.plan_active);
    }

    #[tokio::test]
    async fn cancel_does_not_write_when_plan_lookup_fails() {
        let user_id = Uuid::new_v4();
        let existing = sample_subscription(user_id, Uuid::new_v4(), true);
        let subscription_id = existing.id;

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_by_id_for_user()
            .returning(move |_, _| Ok(Some(existing.clone())));
        subscription_repo.expect_update_subscription_active().never();
        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_by_id()
            .times(1)
            .returning(|_| Err(anyhow!("statement timeout")));

        let err = usecase(plan_repo, subscription_repo)
            .cancel_subscription(user_id, subscription_id)
            .await
            .unwrap_err();

        assert!(matches!(err, SubscriptionError::Storage(_)));
    }

    #[tokio::test]
    async fn current_entitlement_flags_retired_plan() {
        let user_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_active_subscription()
            .returning(move |user_id, _| {
                Ok(Some(SubscriptionWithPlan {
                    subscription: sample_subscription(user_id, plan_id, true),
                    plan: sample_plan(plan_id, BillingInterval::Monthly, PlanStatus::Inactive),
                }))
            });
        let mut listing_repo = MockListingRepository::new();
        listing_repo
            .expect_count_vendor_listings()
            .returning(|_| Ok(ListingUsage::default()));

        let snapshot = SubscriptionUseCase::new(
            Arc::new(MockPlanRepository::new()),
            Arc::new(subscription_repo),
            Arc::new(listing_repo),
        )
        .current_entitlement(user_id)
        .await
        .unwrap()
        .unwrap();

        assert!(!snapshot.plan_active);
    }

    #[tokio::test]
    async fn current_entitlement_is_none_without_subscription() {
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_active_subscription()
            .returning(|_, _| Ok(None));

        let snapshot = usecase(MockPlanRepository::new(), subscription_repo)
            .current_entitlement(Uuid::new_v4())
            .await
            .unwrap();

        assert!(snapshot.is_none());
    }
}
