use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{patch, post},
};
use crates::{
    domain::{
        repositories::{listings::ListingRepository, subscriptions::SubscriptionRepository},
        value_objects::listings::{CreateListingModel, UpdateListingFeaturedModel},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{listings::ListingPostgres, subscriptions::SubscriptionPostgres},
    },
};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::AuthUser, axum_http::error_responses::AppError, usecases::listings::ListingsUseCase,
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let subscription_repository = SubscriptionPostgres::new(Arc::clone(&db_pool));
    let listing_repository = ListingPostgres::new(Arc::clone(&db_pool));

    let listings_usecase =
        ListingsUseCase::new(Arc::new(subscription_repository), Arc::new(listing_repository));

    Router::new()
        .route("/", post(create_listing))
        .route("/:id/featured", patch(update_listing_featured))
        .with_state(Arc::new(listings_usecase))
}

pub async fn create_listing<S, L>(
    State(listings_usecase): State<Arc<ListingsUseCase<S, L>>>,
    auth: AuthUser,
    Json(create_listing_model): Json<CreateListingModel>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    L: ListingRepository + Send + Sync + 'static,
{
    info!(user_id = %auth.user_id, "listings router: create request received");
    match listings_usecase
        .create_listing(&auth, create_listing_model)
        .await
    {
        Ok(listing) => (StatusCode::CREATED, Json(listing)).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn update_listing_featured<S, L>(
    State(listings_usecase): State<Arc<ListingsUseCase<S, L>>>,
    auth: AuthUser,
    Path(listing_id): Path<String>,
    Json(update_model): Json<UpdateListingFeaturedModel>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    L: ListingRepository + Send + Sync + 'static,
{
    let listing_id = match Uuid::parse_str(&listing_id) {
        Ok(id) => id,
        Err(_) => {
            return AppError::BadRequest("Invalid listing id format".to_string()).into_response();
        }
    };

    match listings_usecase
        .update_listing_featured(&auth, listing_id, update_model.is_featured)
        .await
    {
        Ok(listing) => Json(listing).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}
