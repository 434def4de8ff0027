use std::sync::Arc;
use tierline_shared::models::offers::{EditOfferRequest, OfferResource};
use tracing::info;
use uuid::Uuid;

use crate::api::{ApiClient, ApiError, ImageFile};
use crate::services::{AdminServices, UploadImage};

/// Offer list screen, scoped to one status at a time.
pub struct OffersView {
    api: Arc<ApiClient>,
    status: String,
    offers: Vec<OfferResource>,
}

impl OffersView {
    pub fn new(services: &AdminServices) -> Self {
        Self {
            api: services.api.clone(),
            status: "active".to_string(),
            offers: Vec::new(),
        }
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn offers(&self) -> &[OfferResource] {
        &self.offers
    }

    pub async fn load(&mut self, status: &str) -> Result<&[OfferResource], ApiError> {
        let filter = format!("status:{}", status);
        self.offers = self.api.offers().browse(Some(&filter)).await?;
        self.status = status.to_string();
        Ok(&self.offers)
    }

    /// Archive an offer; it leaves the list unless archived offers are shown.
    pub async fn archive(&mut self, id: Uuid) -> Result<(), ApiError> {
        let changes = EditOfferRequest {
            status: Some("archived".to_string()),
            ..Default::default()
        };
        let updated = self.api.offers().edit(id, changes).await?;
        info!("Archived offer {}", updated.code);

        self.offers.retain(|o| o.id != id);
        if updated.status == self.status {
            self.offers.push(updated);
        }
        Ok(())
    }
}

/// Image input that uploads on selection and remembers the stored URL.
pub struct ImageField {
    upload: UploadImage,
    url: Option<String>,
}

impl ImageField {
    pub fn new(upload: UploadImage) -> Self {
        Self { upload, url: None }
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// A failed upload keeps the previous URL.
    pub async fn select(&mut self, file: ImageFile) -> Result<&str, ApiError> {
        let url = self.upload.call(file).await?;
        Ok(self.url.insert(url).as_str())
    }

    pub fn clear(&mut self) {
        self.url = None;
    }
}
