//! Translation between `offers` rows and the `Offer` aggregate.
//!
//! | aggregate             | row                         |
//! |-----------------------|-----------------------------|
//! | `display_title`       | `portal_title`              |
//! | `display_description` | `portal_description`        |
//! | `type` fixed/percent  | `discount_type` amount/percent |
//! | `amount`              | `discount_amount`           |
//! | `cadence`             | `interval`                  |
//! | `status`              | `active`                    |
//! | `tier`                | joined product (read only)  |

use tierline_core::{OfferFilter, RepositoryError};
use tierline_offer::{
    Offer, OfferCadence, OfferDuration, OfferProps, OfferStatus, OfferTier, OfferType,
};

use crate::storage::{OfferRecord, OfferRow, RowFilter};

pub fn offer_type_from_discount_type(discount_type: &str) -> Option<OfferType> {
    match discount_type {
        "amount" => Some(OfferType::Fixed),
        "percent" => Some(OfferType::Percent),
        _ => None,
    }
}

pub fn discount_type_from_offer_type(offer_type: OfferType) -> &'static str {
    match offer_type {
        OfferType::Fixed => "amount",
        OfferType::Percent => "percent",
    }
}

pub fn status_from_active(active: bool) -> OfferStatus {
    if active {
        OfferStatus::Active
    } else {
        OfferStatus::Archived
    }
}

pub fn active_from_status(status: OfferStatus) -> bool {
    status == OfferStatus::Active
}

/// Build the aggregate from a joined row and its redemption count.
pub fn offer_from_record(record: OfferRecord, redemption_count: i64) -> Result<Offer, RepositoryError> {
    let row = record.offer;
    let id = row.id;
    let invalid = |reason: String| RepositoryError::Mapping { id, reason };

    let offer_type = offer_type_from_discount_type(&row.discount_type)
        .ok_or_else(|| invalid(format!("unknown discount_type '{}'", row.discount_type)))?;
    if offer_type == OfferType::Percent && row.currency.is_some() {
        return Err(invalid("percent discount with a currency".to_string()));
    }
    let cadence = row
        .interval
        .parse::<OfferCadence>()
        .map_err(|e| invalid(e.to_string()))?;
    let months = row
        .duration_in_months
        .map(u32::try_from)
        .transpose()
        .map_err(|_| invalid(format!("negative duration_in_months {:?}", row.duration_in_months)))?;
    let duration = OfferDuration::parse(&row.duration, months).map_err(|e| invalid(e.to_string()))?;

    Offer::restore(OfferProps {
        id,
        name: row.name,
        code: row.code,
        display_title: row.portal_title,
        display_description: row.portal_description,
        offer_type,
        amount: row.discount_amount,
        currency: row.currency,
        cadence,
        duration,
        tier: OfferTier { id: row.product_id, name: record.tier_name },
        status: status_from_active(row.active),
        redemption_count,
        stripe_coupon_id: row.stripe_coupon_id,
    })
    .map_err(|e| invalid(e.to_string()))
}

/// Row data for an aggregate. The tier name is not part of the row.
pub fn row_from_offer(offer: &Offer) -> Result<OfferRow, RepositoryError> {
    let duration = offer.duration();
    let duration_in_months = duration
        .months()
        .map(i32::try_from)
        .transpose()
        .map_err(|_| RepositoryError::Mapping {
            id: offer.id(),
            reason: format!("duration_in_months {:?} out of range", duration.months()),
        })?;

    Ok(OfferRow {
        id: offer.id(),
        name: offer.name().to_string(),
        code: offer.code().to_string(),
        portal_title: offer.display_title().to_string(),
        portal_description: offer.display_description().to_string(),
        discount_type: discount_type_from_offer_type(offer.offer_type()).to_string(),
        discount_amount: offer.amount(),
        interval: offer.cadence().to_string(),
        currency: offer.currency().map(str::to_string),
        duration: duration.kind().to_string(),
        duration_in_months,
        active: active_from_status(offer.status()),
        product_id: offer.tier().id,
        stripe_coupon_id: offer.stripe_coupon_id().map(str::to_string),
    })
}

/// Reduce an offer filter to the `active` column. Clauses on any other
/// field are dropped.
pub fn row_filter(filter: &OfferFilter) -> Result<RowFilter, RepositoryError> {
    let mut active = None;

    for clause in filter.clauses().iter().filter(|c| c.field == "status") {
        let status: OfferStatus = clause
            .value
            .parse()
            .map_err(|_| RepositoryError::Filter(format!("unknown status '{}'", clause.value)))?;
        let wanted = active_from_status(status);
        match active {
            Some(existing) if existing != wanted => {
                return Err(RepositoryError::Filter(
                    "conflicting status clauses".to_string(),
                ));
            }
            _ => active = Some(wanted),
        }
    }

    Ok(RowFilter { active, ..Default::default() })
}
