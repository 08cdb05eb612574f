use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Price a provider charges for one session length.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceRate {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub duration_minutes: i32,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub client_id: Uuid,
    pub booking_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Mean rating rounded to one decimal, `None` with no reviews.
pub fn average_rating(reviews: &[Review]) -> Option<f32> {
    if reviews.is_empty() {
        return None;
    }
    let total: i32 = reviews.iter().map(|r| r.rating).sum();
    let mean = total as f32 / reviews.len() as f32;
    Some((mean * 10.0).round() / 10.0)
}
