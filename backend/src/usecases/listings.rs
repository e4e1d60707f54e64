use std::sync::Arc;

use crates::domain::{
    entities::listings::InsertListingEntity,
    repositories::{listings::ListingRepository, subscriptions::SubscriptionRepository},
    value_objects::{
        entitlements::{Decision, DenyReason},
        enums::{listing_statuses::ListingStatus, owner_types::OwnerType},
        listings::{CreateListingModel, ListingDto},
    },
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{auth::AuthUser, usecases::entitlements::EntitlementValidator};

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("listing not found")]
    NotFound,
    #[error("{0}")]
    Denied(DenyReason),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl ListingError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            ListingError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ListingError::NotFound => StatusCode::NOT_FOUND,
            ListingError::Denied(DenyReason::StorageError(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ListingError::Denied(_) => StatusCode::FORBIDDEN,
            ListingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, ListingError>;

pub struct ListingsUseCase<S, L>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    L: ListingRepository + Send + Sync + 'static,
{
    listing_repo: Arc<L>,
    validator: EntitlementValidator<S, L>,
}

impl<S, L> ListingsUseCase<S, L>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    L: ListingRepository + Send + Sync + 'static,
{
    pub fn new(subscription_repo: Arc<S>, listing_repo: Arc<L>) -> Self {
        Self {
            validator: EntitlementValidator::new(subscription_repo, Arc::clone(&listing_repo)),
            listing_repo,
        }
    }

    /// Creates a listing in `pending` review. Vendors go through the plan quota check;
    /// administrators do not.
    pub async fn create_listing(
        &self,
        principal: &AuthUser,
        model: CreateListingModel,
    ) -> UseCaseResult<ListingDto> {
        let user_id = principal.user_id;
        let title = model.title.trim().to_string();
        if title.is_empty() {
            return Err(ListingError::InvalidInput("title is required".to_string()));
        }

        let owner_type = if principal.is_admin() {
            info!(%user_id, "listings: admin create, skipping entitlement check");
            OwnerType::Admin
        } else {
            if let Decision::Deny(reason) = self
                .validator
                .validate_create(user_id, model.is_featured)
                .await
            {
                return Err(ListingError::Denied(reason));
            }
            OwnerType::Vendor
        };

        let listing = self
            .listing_repo
            .insert_listing(InsertListingEntity {
                title,
                category_id: model.category_id,
                owner_id: user_id,
                owner_type: owner_type.to_string(),
                is_featured: model.is_featured,
                status: ListingStatus::Pending.to_string(),
            })
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "listings: failed to insert listing");
                ListingError::Storage(err)
            })?;

        info!(
            %user_id,
            listing_id = %listing.id,
            is_featured = listing.is_featured,
            "listings: listing created"
        );

        Ok(listing.into())
    }

    pub async fn update_listing_featured(
        &self,
        principal: &AuthUser,
        listing_id: Uuid,
        is_featured: bool,
    ) -> UseCaseResult<ListingDto> {
        let user_id = principal.user_id;

        let listing = self
            .listing_repo
            .find_by_id(listing_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    %listing_id,
                    db_error = ?err,
                    "listings: failed to load listing"
                );
                ListingError::Storage(err)
            })?
            .ok_or(ListingError::NotFound)?;

        if !principal.is_admin() {
            let owned = listing.owner_id == user_id
                && OwnerType::from_str(&listing.owner_type) == Some(OwnerType::Vendor);
            if !owned {
                warn!(%user_id, %listing_id, "listings: listing not owned by vendor");
                return Err(ListingError::NotFound);
            }

            if let Decision::Deny(reason) = self
                .validator
                .validate_update(user_id, listing.is_featured, is_featured)
                .await
            {
                return Err(ListingError::Denied(reason));
            }
        }

        if listing.is_featured == is_featured {
            return Ok(listing.into());
        }

        let updated = self
            .listing_repo
            .update_featured(listing_id, is_featured)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    %listing_id,
                    db_error = ?err,
                    "listings: failed to update featured flag"
                );
                ListingError::Storage(err)
            })?;

        info!(%user_id, %listing_id, is_featured, "listings: featured flag updated");

        Ok(updated.into())
    }
}
