use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Every offers payload, in both directions, is wrapped in `{"offers": [...]}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OffersEnvelope<T> {
    pub offers: Vec<T>,
}

impl<T> OffersEnvelope<T> {
    pub fn one(item: T) -> Self {
        Self { offers: vec![item] }
    }

    pub fn into_first(self) -> Option<T> {
        self.offers.into_iter().next()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TierResource {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OfferResource {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub display_title: String,
    pub display_description: String,
    #[serde(rename = "type")]
    pub offer_type: String,
    pub cadence: String,
    pub amount: i32,
    pub duration: String,
    pub duration_in_months: Option<u32>,
    pub currency: Option<String>,
    pub status: String,
    pub redemption_count: i64,
    pub tier: TierResource,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateOfferRequest {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub display_title: String,
    #[serde(default)]
    pub display_description: String,
    #[serde(rename = "type")]
    pub offer_type: String,
    pub cadence: String,
    pub amount: i32,
    pub duration: String,
    #[serde(default)]
    pub duration_in_months: Option<u32>,
    #[serde(default)]
    pub currency: Option<String>,
    pub tier: TierResource,
}

/// Only the fields an existing offer may change. Absent fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EditOfferRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}
