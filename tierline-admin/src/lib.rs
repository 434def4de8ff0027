pub mod api;
pub mod services;
pub mod views;

pub use api::{
    setup_api, ApiClient, ApiConfig, ApiError, ImageFile, ImageUploadRequest, ImagesEnvelope,
    UploadedImage,
};
pub use services::{AdminServices, UploadImage};
pub use views::{ImageField, OffersView};
