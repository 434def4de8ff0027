pub mod models;
pub mod uniqueness;
pub mod validation;

pub use models::{
    Offer, OfferCadence, OfferCreateInput, OfferDiscount, OfferDuration, OfferProps, OfferStatus,
    OfferTier, OfferType,
};
pub use uniqueness::UniqueChecker;
pub use validation::OfferError;
