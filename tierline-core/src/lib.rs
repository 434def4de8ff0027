pub mod events;
pub mod filter;
pub mod payment;
pub mod repository;

pub use events::EventSink;
pub use filter::{FilterClause, FilterError, OfferFilter};
pub use payment::{Coupon, CouponParams, PaymentAdapter, PaymentError};
pub use repository::{OfferRepository, RepositoryError, RepositoryUniqueChecker};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
