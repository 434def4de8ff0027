use std::sync::Arc;
use tierline_core::OfferRepository;

#[derive(Clone)]
pub struct AppState {
    pub offers: Arc<dyn OfferRepository>,
}
