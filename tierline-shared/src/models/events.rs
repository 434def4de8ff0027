use uuid::Uuid;

/// Raised when an offer is created or its code is edited.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct OfferCodeChangeEvent {
    pub offer_id: Uuid,
    /// Absent for freshly created offers.
    pub previous_code: Option<String>,
    pub current_code: String,
    pub timestamp: i64,
}

impl OfferCodeChangeEvent {
    pub fn new(offer_id: Uuid, previous_code: Option<String>, current_code: String) -> Self {
        Self {
            offer_id,
            previous_code,
            current_code,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DomainEvent {
    OfferCodeChange(OfferCodeChangeEvent),
}

impl DomainEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::OfferCodeChange(_) => "offer_code_change",
        }
    }

    /// Partition key used when the event leaves the process.
    pub fn key(&self) -> String {
        match self {
            DomainEvent::OfferCodeChange(e) => e.offer_id.to_string(),
        }
    }
}
