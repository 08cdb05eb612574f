use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_database::supabase::SupabaseClient;
use shared_database::{InvoiceSettingsRepository, ServiceRateRepository, SlotRepository, UserRepository};
use shared_models::records::InvoiceSettings;
use shared_models::user::UNKNOWN_USER_NAME;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

async fn setup() -> (MockServer, Arc<SupabaseClient>, shared_config::AppConfig) {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    let client = Arc::new(SupabaseClient::new(&config));
    (mock_server, client, config)
}

#[tokio::test]
async fn claim_is_conditional_on_slot_being_free() {
    let (mock_server, client, config) = setup().await;
    let slot_id = Uuid::new_v4();
    let provider_id = Uuid::new_v4();
    let start = Utc::now() + Duration::days(2);

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/slots"))
        .and(query_param("id", format!("eq.{}", slot_id)))
        .and(query_param("is_booked", "eq.false"))
        .and(header("Prefer", "return=representation"))
        .and(body_json(json!({ "is_booked": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_response(&slot_id.to_string(), &provider_id.to_string(), start, true)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let repo = SlotRepository::new(client, &config.tables);
    let claimed = repo.claim(slot_id, "token").await.unwrap();

    let slot = claimed.expect("slot should be claimed");
    assert!(slot.is_booked);
    assert_eq!(slot.id, slot_id);
}

#[tokio::test]
async fn claim_returns_none_when_no_row_matched() {
    let (mock_server, client, config) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let repo = SlotRepository::new(client, &config.tables);
    let claimed = repo.claim(Uuid::new_v4(), "token").await.unwrap();
    assert!(claimed.is_none());
}

#[tokio::test]
async fn names_by_id_fills_placeholders_for_missing_users() {
    let (mock_server, client, config) = setup().await;
    let known = Uuid::new_v4();
    let missing = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::client_response(&known.to_string(), "Asha Rao")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let repo = UserRepository::new(client, &config.tables);
    let names = repo.names_by_id(&[known, missing, known], "token").await.unwrap();

    assert_eq!(names.len(), 2);
    assert_eq!(names[&known], "Asha Rao");
    assert_eq!(names[&missing], UNKNOWN_USER_NAME);
}

#[tokio::test]
async fn upstream_errors_are_reported() {
    let (mock_server, client, _config) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/slots"))
        .respond_with(ResponseTemplate::new(401).set_body_string("JWT expired"))
        .mount(&mock_server)
        .await;

    let result: anyhow::Result<Vec<serde_json::Value>> = client
        .request(reqwest::Method::GET, "/rest/v1/slots", Some("token"), None)
        .await;

    let err = result.unwrap_err().to_string();
    assert!(err.contains("Authentication error"));
}

#[tokio::test]
async fn invoice_settings_upsert_merges_on_provider() {
    let (mock_server, client, config) = setup().await;
    let settings = InvoiceSettings {
        provider_id: Uuid::new_v4(),
        rci_number: Some("RCI-1234".to_string()),
        qualification: Some("M.Phil Clinical Psychology".to_string()),
        upi_id: Some("therapist@upi".to_string()),
        business_address: None,
    };

    Mock::given(method("POST"))
        .and(path("/rest/v1/invoice_settings"))
        .and(query_param("on_conflict", "provider_id"))
        .and(header("Prefer", "resolution=merge-duplicates,return=representation"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([settings])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let repo = InvoiceSettingsRepository::new(client, &config.tables);
    let stored = repo.upsert(&settings, "token").await.unwrap();

    assert_eq!(stored, Some(settings));
}

#[tokio::test]
async fn rates_for_many_providers_use_one_in_filter() {
    let (mock_server, client, config) = setup().await;
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/service_rates"))
        .and(query_param("provider_id", format!("in.({},{})", a, b)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::service_rate_response(&Uuid::new_v4().to_string(), &a.to_string(), 50, 1500.0)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let repo = ServiceRateRepository::new(client, &config.tables);
    let rates = repo.list_for_providers(&[a, b], "token").await.unwrap();

    assert_eq!(rates.len(), 1);
    assert_eq!(rates[0].provider_id, a);
}
