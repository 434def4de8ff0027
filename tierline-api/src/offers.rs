use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tierline_core::{OfferFilter, RepositoryUniqueChecker};
use tierline_offer::{Offer, OfferCreateInput, OfferDuration, OfferStatus, OfferTier};
use tierline_shared::models::offers::{
    CreateOfferRequest, EditOfferRequest, OfferResource, OffersEnvelope, TierResource,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/offers", get(browse_offers).post(add_offer))
        .route("/offers/{id}", get(read_offer).put(edit_offer))
}

#[derive(Debug, Deserialize)]
pub struct BrowseQuery {
    pub filter: Option<String>,
}

pub fn offer_resource(offer: &Offer) -> OfferResource {
    let duration = offer.duration();
    OfferResource {
        id: offer.id(),
        name: offer.name().to_string(),
        code: offer.code().to_string(),
        display_title: offer.display_title().to_string(),
        display_description: offer.display_description().to_string(),
        offer_type: offer.offer_type().to_string(),
        cadence: offer.cadence().to_string(),
        amount: offer.amount(),
        duration: duration.kind().to_string(),
        duration_in_months: duration.months(),
        currency: offer.currency().map(str::to_string),
        status: offer.status().to_string(),
        redemption_count: offer.redemption_count(),
        tier: TierResource { id: offer.tier().id, name: offer.tier().name.clone() },
    }
}

fn create_input(req: CreateOfferRequest) -> Result<OfferCreateInput, AppError> {
    Ok(OfferCreateInput {
        name: req.name,
        code: req.code,
        display_title: req.display_title,
        display_description: req.display_description,
        offer_type: req.offer_type.parse()?,
        amount: req.amount,
        currency: req.currency,
        cadence: req.cadence.parse()?,
        duration: OfferDuration::parse(&req.duration, req.duration_in_months)?,
        tier: OfferTier { id: req.tier.id, name: req.tier.name },
    })
}

/// GET /offers?filter=status:active
pub async fn browse_offers(
    State(state): State<AppState>,
    Query(query): Query<BrowseQuery>,
) -> Result<Json<OffersEnvelope<OfferResource>>, AppError> {
    let filter = OfferFilter::parse(query.filter.as_deref().unwrap_or(""))?;
    let offers = state.offers.get_all(&filter).await?;

    Ok(Json(OffersEnvelope { offers: offers.iter().map(offer_resource).collect() }))
}

/// GET /offers/{id}
pub async fn read_offer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OffersEnvelope<OfferResource>>, AppError> {
    let offer = state
        .offers
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Offer {} not found", id)))?;

    Ok(Json(OffersEnvelope::one(offer_resource(&offer))))
}

/// POST /offers
pub async fn add_offer(
    State(state): State<AppState>,
    Json(body): Json<OffersEnvelope<CreateOfferRequest>>,
) -> Result<(StatusCode, Json<OffersEnvelope<OfferResource>>), AppError> {
    let req = body
        .into_first()
        .ok_or_else(|| AppError::ValidationError("No offer provided".to_string()))?;
    let input = create_input(req)?;

    let checker = RepositoryUniqueChecker::new(state.offers.as_ref());
    let mut offer = Offer::create(input, &checker).await?;
    state.offers.save(&mut offer).await?;
    tracing::info!("Created offer {} ({})", offer.id(), offer.code());

    Ok((StatusCode::CREATED, Json(OffersEnvelope::one(offer_resource(&offer)))))
}

/// PUT /offers/{id}
pub async fn edit_offer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<OffersEnvelope<EditOfferRequest>>,
) -> Result<Json<OffersEnvelope<OfferResource>>, AppError> {
    let req = body
        .into_first()
        .ok_or_else(|| AppError::ValidationError("No offer provided".to_string()))?;

    let mut offer = state
        .offers
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Offer {} not found", id)))?;

    let checker = RepositoryUniqueChecker::new(state.offers.as_ref());
    if let Some(name) = &req.name {
        offer.update_name(name, &checker).await?;
    }
    if let Some(code) = &req.code {
        offer.update_code(code, &checker).await?;
    }
    if let Some(title) = &req.display_title {
        offer.set_display_title(title)?;
    }
    if let Some(description) = &req.display_description {
        offer.set_display_description(description)?;
    }
    if let Some(status) = &req.status {
        match status.parse::<OfferStatus>()? {
            OfferStatus::Active => offer.activate(),
            OfferStatus::Archived => offer.archive(),
        }
    }

    state.offers.save(&mut offer).await?;

    Ok(Json(OffersEnvelope::one(offer_resource(&offer))))
}
