use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tierline_offer::{Offer, OfferDiscount};

use crate::BoxError;

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment provider rejected request ({status}): {message}")]
    Provider { status: u16, message: String },
    #[error("Payment provider request failed: {0}")]
    Transport(#[source] BoxError),
}

/// Provider-side coupon parameters. Exactly one of `percent_off` and
/// `amount_off` is set; `currency` travels with `amount_off`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CouponParams {
    pub name: String,
    pub duration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_in_months: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_off: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_off: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl CouponParams {
    pub fn for_offer(offer: &Offer) -> Self {
        let duration = offer.duration();
        let mut params = Self {
            name: offer.name().to_string(),
            duration: duration.kind().to_string(),
            duration_in_months: duration.months(),
            percent_off: None,
            amount_off: None,
            currency: None,
        };

        match offer.discount() {
            OfferDiscount::Percent(percent) => params.percent_off = Some(*percent),
            OfferDiscount::Fixed { amount, currency } => {
                params.amount_off = Some(*amount);
                params.currency = Some(currency.clone());
            }
        }

        params
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Coupon {
    pub id: String,
}

#[async_trait]
pub trait PaymentAdapter: Send + Sync {
    /// Create a coupon with the provider
    async fn create_coupon(&self, params: &CouponParams) -> Result<Coupon, PaymentError>;

    /// Remove a coupon that never made it into storage
    async fn delete_coupon(&self, coupon_id: &str) -> Result<(), PaymentError>;
}
