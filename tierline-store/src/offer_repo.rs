use async_trait::async_trait;
use futures_util::future::BoxFuture;
use std::sync::Arc;
use tierline_core::{
    CouponParams, EventSink, OfferFilter, OfferRepository, PaymentAdapter, RepositoryError,
};
use tierline_offer::Offer;
use tierline_shared::models::events::{DomainEvent, OfferCodeChangeEvent};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::mapping::{offer_from_record, row_filter, row_from_offer};
use crate::storage::{OfferRecord, OfferStorage, RowFilter};

/// Offer repository over an `OfferStorage`, creating provider coupons for new
/// offers and announcing code changes through the injected event sink.
pub struct StoreOfferRepository<S> {
    storage: S,
    payments: Arc<dyn PaymentAdapter>,
    events: Arc<dyn EventSink>,
}

/// A storage transaction plus the provider coupons created under it. Unless
/// the transaction commits, those coupons are deleted again.
pub struct OfferTransaction<T> {
    tx: T,
    created_coupons: Vec<String>,
}

impl<T> OfferTransaction<T> {
    pub fn storage_tx(&mut self) -> &mut T {
        &mut self.tx
    }

    pub fn created_coupons(&self) -> &[String] {
        &self.created_coupons
    }
}

fn storage_tx<'a, T>(tx: &'a mut Option<&mut OfferTransaction<T>>) -> Option<&'a mut T> {
    tx.as_mut().map(|tx| &mut tx.tx)
}

impl<S: OfferStorage> StoreOfferRepository<S> {
    pub fn new(storage: S, payments: Arc<dyn PaymentAdapter>, events: Arc<dyn EventSink>) -> Self {
        Self { storage, payments, events }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub async fn exists_by_name_in(
        &self,
        name: &str,
        mut tx: Option<&mut OfferTransaction<S::Tx>>,
    ) -> Result<bool, RepositoryError> {
        let found = self
            .storage
            .find_one(&RowFilter::by_name(name), storage_tx(&mut tx))
            .await
            .map_err(RepositoryError::Storage)?;
        Ok(found.is_some())
    }

    pub async fn exists_by_code_in(
        &self,
        code: &str,
        mut tx: Option<&mut OfferTransaction<S::Tx>>,
    ) -> Result<bool, RepositoryError> {
        let found = self
            .storage
            .find_one(&RowFilter::by_code(code), storage_tx(&mut tx))
            .await
            .map_err(RepositoryError::Storage)?;
        Ok(found.is_some())
    }

    pub async fn get_by_id_in(
        &self,
        id: Uuid,
        mut tx: Option<&mut OfferTransaction<S::Tx>>,
    ) -> Result<Option<Offer>, RepositoryError> {
        let record = self
            .storage
            .find_one(&RowFilter::by_id(id), storage_tx(&mut tx))
            .await
            .map_err(RepositoryError::Storage)?;

        let Some(record) = record else {
            return Ok(None);
        };

        self.assemble(record, storage_tx(&mut tx)).await.map(Some)
    }

    pub async fn get_all_in(
        &self,
        filter: &OfferFilter,
        mut tx: Option<&mut OfferTransaction<S::Tx>>,
    ) -> Result<Vec<Offer>, RepositoryError> {
        let row_filter = row_filter(filter)?;
        let records = self
            .storage
            .find_all(&row_filter, storage_tx(&mut tx))
            .await
            .map_err(RepositoryError::Storage)?;

        let mut offers = Vec::with_capacity(records.len());
        for record in records {
            offers.push(self.assemble(record, storage_tx(&mut tx)).await?);
        }

        Ok(offers)
    }

    pub async fn save_in(
        &self,
        offer: &mut Offer,
        mut tx: Option<&mut OfferTransaction<S::Tx>>,
    ) -> Result<(), RepositoryError> {
        let mut row = row_from_offer(offer)?;

        let coupon_id = if offer.is_new() {
            let coupon = self
                .payments
                .create_coupon(&CouponParams::for_offer(offer))
                .await?;
            info!("Created Stripe coupon {} for offer {}", coupon.id, offer.id());
            row.stripe_coupon_id = Some(coupon.id.clone());
            Some(coupon.id)
        } else {
            None
        };

        if offer.code_changed() {
            let event = OfferCodeChangeEvent::new(
                offer.id(),
                offer.loaded_code().map(str::to_string),
                offer.code().to_string(),
            );
            debug!("Dispatching code change for offer {}", offer.id());
            self.events.dispatch(DomainEvent::OfferCodeChange(event));
        }

        match coupon_id {
            Some(coupon_id) => {
                if let Err(e) = self.storage.insert(&row, storage_tx(&mut tx)).await {
                    warn!("Insert of offer {} failed, deleting Stripe coupon {}", offer.id(), coupon_id);
                    self.discard_coupon(&coupon_id).await;
                    return Err(RepositoryError::Storage(e));
                }
                debug!("Inserted offer {}", offer.id());
                if let Some(tx) = tx {
                    tx.created_coupons.push(coupon_id.clone());
                }
                offer.attach_stripe_coupon_id(coupon_id)?;
            }
            None => {
                self.storage
                    .update(&row, storage_tx(&mut tx))
                    .await
                    .map_err(RepositoryError::Storage)?;
                debug!("Updated offer {}", offer.id());
            }
        }

        offer.mark_persisted();
        Ok(())
    }

    pub async fn begin_transaction(&self) -> Result<OfferTransaction<S::Tx>, RepositoryError> {
        let tx = self.storage.begin().await.map_err(RepositoryError::Storage)?;
        Ok(OfferTransaction { tx, created_coupons: Vec::new() })
    }

    /// A failed commit leaves no rows behind, so coupons created under the
    /// transaction are deleted.
    pub async fn commit_transaction(
        &self,
        tx: OfferTransaction<S::Tx>,
    ) -> Result<(), RepositoryError> {
        let OfferTransaction { tx, created_coupons } = tx;
        if let Err(e) = self.storage.commit(tx).await {
            warn!("Commit failed, deleting {} Stripe coupon(s)", created_coupons.len());
            for coupon_id in &created_coupons {
                self.discard_coupon(coupon_id).await;
            }
            return Err(RepositoryError::Storage(e));
        }
        Ok(())
    }

    /// Offers saved under a rolled back transaction still carry their coupon
    /// id in memory; reload them before further use.
    pub async fn rollback_transaction(
        &self,
        tx: OfferTransaction<S::Tx>,
    ) -> Result<(), RepositoryError> {
        let OfferTransaction { tx, created_coupons } = tx;
        let result = self.storage.rollback(tx).await.map_err(RepositoryError::Storage);
        for coupon_id in &created_coupons {
            self.discard_coupon(coupon_id).await;
        }
        result
    }

    /// Run `work` inside one storage transaction. Commits when `work` succeeds,
    /// rolls back otherwise. Work that must borrow caller state can drive
    /// `begin_transaction` and `commit_transaction` directly.
    pub async fn create_transaction<T, F>(&self, work: F) -> Result<T, RepositoryError>
    where
        T: Send,
        F: for<'t> FnOnce(
                &'t Self,
                &'t mut OfferTransaction<S::Tx>,
            ) -> BoxFuture<'t, Result<T, RepositoryError>>
            + Send,
    {
        let mut tx = self.begin_transaction().await?;

        match work(self, &mut tx).await {
            Ok(value) => {
                self.commit_transaction(tx).await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = self.rollback_transaction(tx).await {
                    warn!("Rollback failed after {}: {}", e, rollback_err);
                }
                Err(e)
            }
        }
    }

    async fn assemble(
        &self,
        record: OfferRecord,
        tx: Option<&mut S::Tx>,
    ) -> Result<Offer, RepositoryError> {
        let redemption_count = self
            .storage
            .count_redemptions(record.offer.id, tx)
            .await
            .map_err(RepositoryError::Storage)?;
        offer_from_record(record, redemption_count)
    }

    // The row never landed, so the coupon would be orphaned. A crash before this
    // point still leaves one behind.
    async fn discard_coupon(&self, coupon_id: &str) {
        if let Err(e) = self.payments.delete_coupon(coupon_id).await {
            warn!("Could not delete orphaned Stripe coupon {}: {}", coupon_id, e);
        }
    }
}

#[async_trait]
impl<S: OfferStorage> OfferRepository for StoreOfferRepository<S> {
    async fn exists_by_name(&self, name: &str) -> Result<bool, RepositoryError> {
        self.exists_by_name_in(name, None).await
    }

    async fn exists_by_code(&self, code: &str) -> Result<bool, RepositoryError> {
        self.exists_by_code_in(code, None).await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Offer>, RepositoryError> {
        self.get_by_id_in(id, None).await
    }

    async fn get_all(&self, filter: &OfferFilter) -> Result<Vec<Offer>, RepositoryError> {
        self.get_all_in(filter, None).await
    }

    async fn save(&self, offer: &mut Offer) -> Result<(), RepositoryError> {
        self.save_in(offer, None).await
    }
}
