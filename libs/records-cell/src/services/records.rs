use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{ClientRecordRepository, SupabaseClient, UserRepository};
use shared_models::records::{ClientRecord, RecordSource, RiskStatus};
use shared_models::user::UNKNOWN_USER_NAME;

use crate::models::{Homework, RecordView, RecordsError, UpdateRecordRequest};

pub struct RecordService {
    records: ClientRecordRepository,
    users: UserRepository,
}

impl RecordService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self {
            records: ClientRecordRepository::new(supabase.clone(), &config.tables),
            users: UserRepository::new(supabase, &config.tables),
        }
    }

    pub async fn get_or_create_record(
        &self,
        provider_id: Uuid,
        client_id: Uuid,
        auth_token: &str,
    ) -> Result<ClientRecord, RecordsError> {
        if let Some(record) = self.records.find(provider_id, client_id, auth_token).await? {
            return Ok(record);
        }

        debug!("No record for client {} yet, creating one", client_id);
        self.insert_record(provider_id, client_id, RecordSource::Marketplace, auth_token)
            .await
    }

    /// A client the provider sees outside the marketplace.
    pub async fn create_offline_record(
        &self,
        provider_id: Uuid,
        client_id: Uuid,
        auth_token: &str,
    ) -> Result<ClientRecord, RecordsError> {
        if self.records.find(provider_id, client_id, auth_token).await?.is_some() {
            return Err(RecordsError::RecordExists);
        }

        self.insert_record(provider_id, client_id, RecordSource::Offline, auth_token)
            .await
    }

    pub async fn update_record(
        &self,
        provider_id: Uuid,
        client_id: Uuid,
        request: UpdateRecordRequest,
        auth_token: &str,
    ) -> Result<ClientRecord, RecordsError> {
        let record = self.get_or_create_record(provider_id, client_id, auth_token).await?;

        let mut patch = Map::new();
        if let Some(risk) = request.risk_status {
            patch.insert("risk_status".to_string(), json!(risk));
        }
        if let Some(problem) = request.presenting_problem {
            patch.insert("presenting_problem".to_string(), json!(problem));
        }
        if let Some(medications) = request.medications {
            patch.insert("medications".to_string(), json!(medications));
        }
        if let Some(contact) = request.emergency_contact {
            patch.insert("emergency_contact".to_string(), json!(contact));
        }
        if let Some(homework) = request.homework_list {
            let cleaned: Vec<String> = homework
                .into_iter()
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect();
            patch.insert("homework_list".to_string(), json!(cleaned));
        }

        if patch.is_empty() {
            return Ok(record);
        }
        patch.insert("updated_at".to_string(), json!(Utc::now()));

        let updated = self
            .records
            .update(record.id, Value::Object(patch), auth_token)
            .await?
            .ok_or(RecordsError::RecordNotFound)?;

        info!("Updated record {} of provider {}", updated.id, provider_id);
        Ok(updated)
    }

    /// The provider's roster, newest activity first.
    pub async fn list_records(&self, provider_id: Uuid, auth_token: &str) -> Result<Vec<RecordView>, RecordsError> {
        let records = self.records.list_for_provider(provider_id, auth_token).await?;
        let client_ids: Vec<Uuid> = records.iter().map(|r| r.client_id).collect();
        let names = self.users.names_by_id(&client_ids, auth_token).await?;

        Ok(records
            .into_iter()
            .map(|record| RecordView {
                client_name: names
                    .get(&record.client_id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_USER_NAME.to_string()),
                record,
            })
            .collect())
    }

    pub async fn get_homework(
        &self,
        client_id: Uuid,
        provider_id: Uuid,
        auth_token: &str,
    ) -> Result<Homework, RecordsError> {
        let homework_list = self
            .records
            .find(provider_id, client_id, auth_token)
            .await?
            .map(|record| record.homework_list)
            .unwrap_or_default();

        Ok(Homework {
            provider_id,
            homework_list,
        })
    }

    async fn insert_record(
        &self,
        provider_id: Uuid,
        client_id: Uuid,
        source: RecordSource,
        auth_token: &str,
    ) -> Result<ClientRecord, RecordsError> {
        let body = json!({
            "provider_id": provider_id,
            "client_id": client_id,
            "risk_status": RiskStatus::Stable,
            "homework_list": [],
            "source": source,
            "updated_at": Utc::now()
        });

        let record = self
            .records
            .insert(body, auth_token)
            .await?
            .ok_or_else(|| RecordsError::Database("Record insert returned no rows".to_string()))?;

        info!("Created {:?} record for client {} of provider {}", source, client_id, provider_id);
        Ok(record)
    }
}
