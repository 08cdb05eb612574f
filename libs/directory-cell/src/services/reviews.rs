use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{BookingRepository, ReviewRepository, SupabaseClient, UserRepository};
use shared_models::booking::BookingStatus;
use shared_models::directory::{average_rating, Review};

use crate::models::{CreateReviewRequest, DirectoryError};

pub struct ReviewService {
    reviews: ReviewRepository,
    bookings: BookingRepository,
    users: UserRepository,
}

impl ReviewService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self {
            reviews: ReviewRepository::new(supabase.clone(), &config.tables),
            bookings: BookingRepository::new(supabase.clone(), &config.tables),
            users: UserRepository::new(supabase, &config.tables),
        }
    }

    pub async fn create_review(
        &self,
        client_id: Uuid,
        request: CreateReviewRequest,
        auth_token: &str,
    ) -> Result<Review, DirectoryError> {
        if !(1..=5).contains(&request.rating) {
            return Err(DirectoryError::InvalidRating);
        }

        let booking = self
            .bookings
            .find_by_id(request.booking_id, auth_token)
            .await?
            .filter(|b| b.client_id == client_id && b.status == BookingStatus::Confirmed)
            .ok_or(DirectoryError::NoConfirmedBooking)?;

        if self.reviews.find_by_booking(booking.id, auth_token).await?.is_some() {
            return Err(DirectoryError::AlreadyReviewed);
        }

        let body = json!({
            "provider_id": booking.provider_id,
            "client_id": client_id,
            "booking_id": booking.id,
            "rating": request.rating,
            "comment": request.comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
            "created_at": Utc::now()
        });

        let review = self
            .reviews
            .insert(body, auth_token)
            .await?
            .ok_or_else(|| DirectoryError::Database("Review insert returned no rows".to_string()))?;

        info!("Client {} reviewed provider {}", client_id, booking.provider_id);
        self.refresh_rating(booking.provider_id, auth_token).await;

        Ok(review)
    }

    pub async fn list_reviews(&self, provider_id: Uuid, auth_token: &str) -> Result<Vec<Review>, DirectoryError> {
        Ok(self.reviews.list_for_provider(provider_id, auth_token).await?)
    }

    /// The stored rating is a cache of the review average; a failed refresh
    /// leaves the old value until the next review.
    async fn refresh_rating(&self, provider_id: Uuid, auth_token: &str) {
        let reviews = match self.reviews.list_for_provider(provider_id, auth_token).await {
            Ok(reviews) => reviews,
            Err(e) => {
                warn!("Could not load reviews for provider {}: {}", provider_id, e);
                return;
            }
        };

        let rating = average_rating(&reviews);
        if let Err(e) = self
            .users
            .update(provider_id, json!({ "rating": rating }), auth_token)
            .await
        {
            warn!("Could not update rating for provider {}: {}", provider_id, e);
        }
    }
}
