use futures_util::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

use crate::api::{setup_api, ApiClient, ApiConfig, ApiError, ImageFile, ImageUploadRequest};

pub type UploadFuture = BoxFuture<'static, Result<String, ApiError>>;

/// Uploads one file and resolves to the URL of the first stored image.
#[derive(Clone)]
pub struct UploadImage(Arc<dyn Fn(ImageFile) -> UploadFuture + Send + Sync>);

impl UploadImage {
    pub fn new<F>(upload: F) -> Self
    where
        F: Fn(ImageFile) -> UploadFuture + Send + Sync + 'static,
    {
        Self(Arc::new(upload))
    }

    pub fn from_client(api: Arc<ApiClient>) -> Self {
        Self::new(move |file| {
            let api = api.clone();
            Box::pin(async move {
                let envelope = api.images().upload(ImageUploadRequest::new(file)).await?;
                envelope
                    .images
                    .into_iter()
                    .next()
                    .map(|image| image.url)
                    .ok_or(ApiError::EmptyUpload)
            })
        })
    }

    pub async fn call(&self, file: ImageFile) -> Result<String, ApiError> {
        (self.0)(file).await
    }
}

impl fmt::Debug for UploadImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UploadImage")
    }
}

/// Everything admin views need from the outside world. Built once and handed
/// to each view's constructor.
#[derive(Clone)]
pub struct AdminServices {
    pub api: Arc<ApiClient>,
    pub upload_image: UploadImage,
}

impl AdminServices {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let api = Arc::new(setup_api(config)?);
        let upload_image = UploadImage::from_client(api.clone());
        Ok(Self { api, upload_image })
    }

    pub fn from_parts(api: Arc<ApiClient>, upload_image: UploadImage) -> Self {
        Self { api, upload_image }
    }
}
