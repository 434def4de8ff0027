use async_trait::async_trait;
use tierline_core::BoxError;
use uuid::Uuid;

/// A row of the `offers` table
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct OfferRow {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub portal_title: String,
    pub portal_description: String,
    pub discount_type: String,
    pub discount_amount: i32,
    pub interval: String,
    pub currency: Option<String>,
    pub duration: String,
    pub duration_in_months: Option<i32>,
    pub active: bool,
    pub product_id: Uuid,
    pub stripe_coupon_id: Option<String>,
}

/// Offer row joined with the name of the product (tier) it discounts
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct OfferRecord {
    #[sqlx(flatten)]
    pub offer: OfferRow,
    pub tier_name: String,
}

/// Column equality constraints. `None` leaves a column unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub code: Option<String>,
    pub active: Option<bool>,
}

impl RowFilter {
    pub fn by_id(id: Uuid) -> Self {
        Self { id: Some(id), ..Default::default() }
    }

    pub fn by_name(name: &str) -> Self {
        Self { name: Some(name.to_string()), ..Default::default() }
    }

    pub fn by_code(code: &str) -> Self {
        Self { code: Some(code.to_string()), ..Default::default() }
    }
}

/// An update matched no row; the offer was deleted or never inserted.
#[derive(Debug, thiserror::Error)]
#[error("No offer row with id {0} to update")]
pub struct NoRowsUpdated(pub Uuid);

/// Row-level access to offers, products and redemptions.
///
/// Every query accepts an optional transaction; `None` runs against the
/// connection pool directly.
#[async_trait]
pub trait OfferStorage: Send + Sync {
    type Tx: Send;

    async fn begin(&self) -> Result<Self::Tx, BoxError>;

    async fn commit(&self, tx: Self::Tx) -> Result<(), BoxError>;

    async fn rollback(&self, tx: Self::Tx) -> Result<(), BoxError>;

    async fn find_one(
        &self,
        filter: &RowFilter,
        tx: Option<&mut Self::Tx>,
    ) -> Result<Option<OfferRecord>, BoxError>;

    async fn find_all(
        &self,
        filter: &RowFilter,
        tx: Option<&mut Self::Tx>,
    ) -> Result<Vec<OfferRecord>, BoxError>;

    async fn count_redemptions(
        &self,
        offer_id: Uuid,
        tx: Option<&mut Self::Tx>,
    ) -> Result<i64, BoxError>;

    async fn insert(&self, row: &OfferRow, tx: Option<&mut Self::Tx>) -> Result<(), BoxError>;

    /// Fails with `NoRowsUpdated` when no row has `row.id`.
    async fn update(&self, row: &OfferRow, tx: Option<&mut Self::Tx>) -> Result<(), BoxError>;
}
