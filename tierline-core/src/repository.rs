use async_trait::async_trait;
use tierline_offer::{Offer, OfferError, UniqueChecker};
use uuid::Uuid;

use crate::filter::{FilterError, OfferFilter};
use crate::payment::PaymentError;
use crate::BoxError;

/// Failures surfaced by the offer repository. Collaborator errors are carried
/// as their source, untouched.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Storage error: {0}")]
    Storage(#[source] BoxError),
    #[error(transparent)]
    Payment(#[from] PaymentError),
    #[error(transparent)]
    Offer(#[from] OfferError),
    #[error("Offer row {id} cannot be mapped: {reason}")]
    Mapping { id: Uuid, reason: String },
    #[error("Invalid filter: {0}")]
    Filter(String),
}

impl From<FilterError> for RepositoryError {
    fn from(err: FilterError) -> Self {
        RepositoryError::Filter(err.to_string())
    }
}

/// Repository trait for offer data access
#[async_trait]
pub trait OfferRepository: Send + Sync {
    /// `false` when no offer carries this name.
    async fn exists_by_name(&self, name: &str) -> Result<bool, RepositoryError>;

    /// `false` when no offer carries this code.
    async fn exists_by_code(&self, code: &str) -> Result<bool, RepositoryError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Offer>, RepositoryError>;

    /// Only `status` clauses of the filter are honoured.
    async fn get_all(&self, filter: &OfferFilter) -> Result<Vec<Offer>, RepositoryError>;

    /// Insert a new offer (creating its provider coupon first) or update an existing one.
    async fn save(&self, offer: &mut Offer) -> Result<(), RepositoryError>;
}

/// Uniqueness checks backed by the repository's existence queries.
pub struct RepositoryUniqueChecker<'a> {
    repository: &'a dyn OfferRepository,
}

impl<'a> RepositoryUniqueChecker<'a> {
    pub fn new(repository: &'a dyn OfferRepository) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl UniqueChecker for RepositoryUniqueChecker<'_> {
    async fn is_unique_name(&self, name: &str) -> Result<bool, BoxError> {
        let exists = self.repository.exists_by_name(name).await?;
        Ok(!exists)
    }

    async fn is_unique_code(&self, code: &str) -> Result<bool, BoxError> {
        let exists = self.repository.exists_by_code(code).await?;
        Ok(!exists)
    }
}
