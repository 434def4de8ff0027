use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tierline_core::BoxError;
use uuid::Uuid;

use crate::storage::{NoRowsUpdated, OfferRecord, OfferRow, OfferStorage, RowFilter};

const SELECT_OFFERS: &str = r#"
    SELECT o.id, o.name, o.code, o.portal_title, o.portal_description, o.discount_type,
           o.discount_amount, o."interval", o.currency, o.duration, o.duration_in_months,
           o.active, o.product_id, o.stripe_coupon_id, p.name AS tier_name
    FROM offers o
    JOIN products p ON p.id = o.product_id
    WHERE ($1::uuid IS NULL OR o.id = $1)
      AND ($2::text IS NULL OR o.name = $2)
      AND ($3::text IS NULL OR o.code = $3)
      AND ($4::bool IS NULL OR o.active = $4)
"#;

pub struct PgOfferStorage {
    pool: PgPool,
}

impl PgOfferStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OfferStorage for PgOfferStorage {
    type Tx = Transaction<'static, Postgres>;

    async fn begin(&self) -> Result<Self::Tx, BoxError> {
        Ok(self.pool.begin().await?)
    }

    async fn commit(&self, tx: Self::Tx) -> Result<(), BoxError> {
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&self, tx: Self::Tx) -> Result<(), BoxError> {
        tx.rollback().await?;
        Ok(())
    }

    async fn find_one(
        &self,
        filter: &RowFilter,
        tx: Option<&mut Self::Tx>,
    ) -> Result<Option<OfferRecord>, BoxError> {
        let sql = format!("{} LIMIT 1", SELECT_OFFERS);
        let query = sqlx::query_as::<_, OfferRecord>(&sql)
            .bind(filter.id)
            .bind(filter.name.as_deref())
            .bind(filter.code.as_deref())
            .bind(filter.active);

        let record = match tx {
            Some(tx) => query.fetch_optional(&mut **tx).await?,
            None => query.fetch_optional(&self.pool).await?,
        };

        Ok(record)
    }

    async fn find_all(
        &self,
        filter: &RowFilter,
        tx: Option<&mut Self::Tx>,
    ) -> Result<Vec<OfferRecord>, BoxError> {
        let query = sqlx::query_as::<_, OfferRecord>(SELECT_OFFERS)
            .bind(filter.id)
            .bind(filter.name.as_deref())
            .bind(filter.code.as_deref())
            .bind(filter.active);

        let records = match tx {
            Some(tx) => query.fetch_all(&mut **tx).await?,
            None => query.fetch_all(&self.pool).await?,
        };

        Ok(records)
    }

    async fn count_redemptions(
        &self,
        offer_id: Uuid,
        tx: Option<&mut Self::Tx>,
    ) -> Result<i64, BoxError> {
        let query = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM offer_redemptions WHERE offer_id = $1",
        )
        .bind(offer_id);

        let count = match tx {
            Some(tx) => query.fetch_one(&mut **tx).await?,
            None => query.fetch_one(&self.pool).await?,
        };

        Ok(count)
    }

    async fn insert(&self, row: &OfferRow, tx: Option<&mut Self::Tx>) -> Result<(), BoxError> {
        let query = sqlx::query(
            r#"
            INSERT INTO offers (id, name, code, portal_title, portal_description, discount_type,
                                discount_amount, "interval", currency, duration, duration_in_months,
                                active, product_id, stripe_coupon_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(row.id)
        .bind(&row.name)
        .bind(&row.code)
        .bind(&row.portal_title)
        .bind(&row.portal_description)
        .bind(&row.discount_type)
        .bind(row.discount_amount)
        .bind(&row.interval)
        .bind(row.currency.as_deref())
        .bind(&row.duration)
        .bind(row.duration_in_months)
        .bind(row.active)
        .bind(row.product_id)
        .bind(row.stripe_coupon_id.as_deref());

        match tx {
            Some(tx) => query.execute(&mut **tx).await?,
            None => query.execute(&self.pool).await?,
        };

        Ok(())
    }

    // product_id and stripe_coupon_id are fixed at insert time.
    async fn update(&self, row: &OfferRow, tx: Option<&mut Self::Tx>) -> Result<(), BoxError> {
        let query = sqlx::query(
            r#"
            UPDATE offers
            SET name = $2, code = $3, portal_title = $4, portal_description = $5,
                discount_type = $6, discount_amount = $7, "interval" = $8, currency = $9,
                duration = $10, duration_in_months = $11, active = $12, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(row.id)
        .bind(&row.name)
        .bind(&row.code)
        .bind(&row.portal_title)
        .bind(&row.portal_description)
        .bind(&row.discount_type)
        .bind(row.discount_amount)
        .bind(&row.interval)
        .bind(row.currency.as_deref())
        .bind(&row.duration)
        .bind(row.duration_in_months)
        .bind(row.active);

        let result = match tx {
            Some(tx) => query.execute(&mut **tx).await?,
            None => query.execute(&self.pool).await?,
        };

        if result.rows_affected() == 0 {
            return Err(Box::new(NoRowsUpdated(row.id)));
        }

        Ok(())
    }
}
