pub mod app_config;
pub mod database;
pub mod events;
pub mod mapping;
pub mod offer_repo;
pub mod pg_storage;
pub mod storage;
pub mod stripe;

pub use database::DbClient;
pub use events::{spawn_event_forwarder, ChannelEventSink, EventProducer};
pub use offer_repo::{OfferTransaction, StoreOfferRepository};
pub use pg_storage::PgOfferStorage;
pub use storage::{NoRowsUpdated, OfferStorage};
pub use stripe::StripeCouponClient;
