use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RiskStatus {
    #[default]
    Stable,
    Moderate,
    High,
}

/// Whether the client arrived through the marketplace or was added by hand.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    #[default]
    Marketplace,
    Offline,
}

/// A provider's private notes on one client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub client_id: Uuid,
    #[serde(default)]
    pub risk_status: RiskStatus,
    pub presenting_problem: Option<String>,
    pub medications: Option<String>,
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub homework_list: Vec<String>,
    #[serde(default)]
    pub source: RecordSource,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceSettings {
    pub provider_id: Uuid,
    pub rci_number: Option<String>,
    pub qualification: Option<String>,
    pub upi_id: Option<String>,
    pub business_address: Option<String>,
}
