use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{ReviewRepository, ServiceRateRepository, SupabaseClient, UserRepository};
use shared_models::directory::ServiceRate;
use shared_models::user::{PublicProfile, Role, UserProfile};

use crate::models::{DirectoryError, ProviderCard, ProviderDetail, ProviderSearchFilters, DEFAULT_SEARCH_LIMIT};

pub struct SearchService {
    users: UserRepository,
    rates: ServiceRateRepository,
    reviews: ReviewRepository,
}

impl SearchService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self {
            users: UserRepository::new(supabase.clone(), &config.tables),
            rates: ServiceRateRepository::new(supabase.clone(), &config.tables),
            reviews: ReviewRepository::new(supabase, &config.tables),
        }
    }

    /// Two queries regardless of result size: every therapist, then every
    /// rate for those therapists.
    pub async fn search_providers(
        &self,
        filters: &ProviderSearchFilters,
        auth_token: &str,
    ) -> Result<Vec<ProviderCard>, DirectoryError> {
        let providers = self.users.list_by_role(Some(Role::Therapist), auth_token).await?;
        let ids: Vec<Uuid> = providers.iter().map(|p| p.id).collect();
        let rates = self.rates.list_for_providers(&ids, auth_token).await?;

        debug!("Filtering {} providers with {} rates", providers.len(), rates.len());
        Ok(filter_providers(providers, rates, filters))
    }

    pub async fn get_provider_profile(
        &self,
        provider_id: Uuid,
        auth_token: &str,
    ) -> Result<ProviderDetail, DirectoryError> {
        let provider = self
            .users
            .find_by_id(provider_id, auth_token)
            .await?
            .filter(UserProfile::is_therapist)
            .ok_or(DirectoryError::ProviderNotFound)?;

        let rates = self.rates.list_for_provider(provider_id, auth_token).await?;
        let reviews = self.reviews.list_for_provider(provider_id, auth_token).await?;

        Ok(ProviderDetail {
            profile: PublicProfile::from(&provider),
            meeting_link_available: provider.meeting_link.is_some(),
            rates,
            reviews,
        })
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn matches_text(provider: &UserProfile, query: &str) -> bool {
    contains_ci(&provider.full_name, query)
        || provider.bio.as_deref().is_some_and(|bio| contains_ci(bio, query))
        || provider.specialties.iter().any(|s| contains_ci(s, query))
}

fn matches_price(rates: &[ServiceRate], filters: &ProviderSearchFilters) -> bool {
    if filters.max_price.is_none() && filters.duration_minutes.is_none() {
        return true;
    }

    rates.iter().any(|rate| {
        filters.duration_minutes.map_or(true, |d| rate.duration_minutes == d)
            && filters.max_price.map_or(true, |max| rate.price <= max)
    })
}

/// Best rated first, unrated last, ties broken by name.
fn by_rating_then_name(a: &ProviderCard, b: &ProviderCard) -> Ordering {
    match (a.profile.rating, b.profile.rating) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.profile.full_name.to_lowercase().cmp(&b.profile.full_name.to_lowercase()))
}

pub fn filter_providers(
    providers: Vec<UserProfile>,
    rates: Vec<ServiceRate>,
    filters: &ProviderSearchFilters,
) -> Vec<ProviderCard> {
    let mut rates_by_provider: HashMap<Uuid, Vec<ServiceRate>> = HashMap::new();
    for rate in rates {
        rates_by_provider.entry(rate.provider_id).or_default().push(rate);
    }

    let query = filters.q.as_deref().map(str::trim).filter(|q| !q.is_empty()).map(str::to_lowercase);
    let specialty = filters.specialty.as_deref().map(str::to_lowercase);
    let metro = filters.metro_station.as_deref().map(str::to_lowercase);

    let mut cards: Vec<ProviderCard> = providers
        .into_iter()
        .filter(|p| p.is_therapist())
        .filter(|p| !filters.verified_only || p.is_verified)
        .filter(|p| query.as_deref().map_or(true, |q| matches_text(p, q)))
        .filter(|p| {
            specialty
                .as_deref()
                .map_or(true, |wanted| p.specialties.iter().any(|s| s.to_lowercase() == wanted))
        })
        .filter(|p| {
            metro.as_deref().map_or(true, |wanted| {
                p.metro_station.as_deref().is_some_and(|m| m.to_lowercase() == wanted)
            })
        })
        .filter_map(|p| {
            let rates = rates_by_provider.remove(&p.id).unwrap_or_default();
            if !matches_price(&rates, filters) {
                return None;
            }
            let starting_price = rates.iter().map(|r| r.price).reduce(f64::min);
            Some(ProviderCard {
                profile: PublicProfile::from(&p),
                rates,
                starting_price,
            })
        })
        .collect();

    cards.sort_by(by_rating_then_name);

    cards
        .into_iter()
        .skip(filters.offset.unwrap_or(0))
        .take(filters.limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
        .collect()
}
