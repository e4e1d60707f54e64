use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use crates::{
    domain::{
        repositories::{
            listings::ListingRepository, plans::PlanRepository,
            subscriptions::SubscriptionRepository,
        },
        value_objects::subscriptions::{AssignPlanModel, SubscriptionStateFilter},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            listings::ListingPostgres, plans::PlanPostgres, subscriptions::SubscriptionPostgres,
        },
    },
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    axum_http::error_responses::AppError,
    usecases::subscriptions::SubscriptionUseCase,
};

#[derive(Debug, Deserialize)]
pub struct ListSubscriptionsQuery {
    page: Option<i64>,
    limit: Option<i64>,
    #[serde(default)]
    status: SubscriptionStateFilter,
}

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let plan_repository = PlanPostgres::new(Arc::clone(&db_pool));
    let subscription_repository = SubscriptionPostgres::new(Arc::clone(&db_pool));
    let listing_repository = ListingPostgres::new(Arc::clone(&db_pool));

    let subscriptions_usecase = SubscriptionUseCase::new(
        Arc::new(plan_repository),
        Arc::new(subscription_repository),
        Arc::new(listing_repository),
    );

    Router::new()
        .route("/", get(list_subscriptions))
        .route("/plans", get(list_plans))
        .route("/current", get(current_subscription))
        .route("/assign", post(assign_plan))
        .route("/:id/cancel", put(cancel_subscription))
        .with_state(Arc::new(subscriptions_usecase))
}

pub async fn list_plans<P, S, L>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<P, S, L>>>,
    _auth: AuthUser,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    L: ListingRepository + Send + Sync + 'static,
{
    match subscriptions_usecase.list_plans().await {
        Ok(plans) => Json(plans).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn current_subscription<P, S, L>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<P, S, L>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    L: ListingRepository + Send + Sync + 'static,
{
    match subscriptions_usecase.current_entitlement(user_id).await {
        Ok(Some(snapshot)) => Json(snapshot).into_response(),
        Ok(None) => AppError::NotFound("You do not have an active plan".to_string()).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn list_subscriptions<P, S, L>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<P, S, L>>>,
    AuthUser { user_id, .. }: AuthUser,
    Query(query): Query<ListSubscriptionsQuery>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    L: ListingRepository + Send + Sync + 'static,
{
    match subscriptions_usecase
        .list_subscriptions(user_id, query.status, query.page, query.limit)
        .await
    {
        Ok(page) => Json(page).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn assign_plan<P, S, L>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<P, S, L>>>,
    AuthUser { user_id, .. }: AuthUser,
    Json(assign_plan_model): Json<AssignPlanModel>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    L: ListingRepository + Send + Sync + 'static,
{
    info!(%user_id, "subscriptions router: assign request received");
    match subscriptions_usecase
        .assign_plan(user_id, &assign_plan_model.plan_id)
        .await
    {
        Ok(subscription) => (StatusCode::CREATED, Json(subscription)).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn cancel_subscription<P, S, L>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<P, S, L>>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(subscription_id): Path<String>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    L: ListingRepository + Send + Sync + 'static,
{
    let subscription_id = match Uuid::parse_str(&subscription_id) {
        Ok(id) => id,
        Err(_) => {
            return AppError::BadRequest("Invalid subscription id format".to_string())
                .into_response();
        }
    };

    match subscriptions_usecase
        .cancel_subscription(user_id, subscription_id)
        .await
    {
        Ok(subscription) => Json(subscription).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}
