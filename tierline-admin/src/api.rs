use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tierline_shared::models::offers::{
    CreateOfferRequest, EditOfferRequest, OfferResource, OffersEnvelope,
};
use tracing::{debug, error};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Upload returned no images")]
    EmptyUpload,

    #[error("Response contained no offers")]
    EmptyResponse,

    #[error("Invalid API config: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub version: String,
}

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Clone)]
pub struct ImageUploadRequest {
    pub file: ImageFile,
    pub purpose: Option<String>,
    pub image_ref: Option<String>,
}

impl ImageUploadRequest {
    pub fn new(file: ImageFile) -> Self {
        Self { file, purpose: None, image_ref: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadedImage {
    pub url: String,
    #[serde(rename = "ref", default)]
    pub image_ref: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImagesEnvelope {
    pub images: Vec<UploadedImage>,
}

/// Build a client for the admin API. Every request carries
/// `Accept-Version: v{version}`.
pub fn setup_api(config: &ApiConfig) -> Result<ApiClient, ApiError> {
    let version = config.version.trim_start_matches('v');
    if version.is_empty() {
        return Err(ApiError::InvalidConfig("version is required".to_string()));
    }
    let accept_version = HeaderValue::from_str(&format!("v{}", version))
        .map_err(|e| ApiError::InvalidConfig(e.to_string()))?;

    let mut headers = HeaderMap::new();
    headers.insert("accept-version", accept_version);

    let http = reqwest::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(30))
        .build()?;

    Ok(ApiClient {
        http,
        base_url: config.base_url.trim_end_matches('/').to_string(),
    })
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn images(&self) -> ImagesApi<'_> {
        ImagesApi { client: self }
    }

    pub fn offers(&self) -> OffersApi<'_> {
        OffersApi { client: self }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Admin API request failed with {}: {}", status, body);
            return Err(ApiError::Status { status: status.as_u16(), body });
        }
        Ok(response.json::<T>().await?)
    }
}

pub struct ImagesApi<'a> {
    client: &'a ApiClient,
}

impl ImagesApi<'_> {
    /// POST /images/upload/ as multipart form data.
    pub async fn upload(&self, request: ImageUploadRequest) -> Result<ImagesEnvelope, ApiError> {
        debug!("Uploading image {}", request.file.name);
        let part = Part::bytes(request.file.bytes)
            .file_name(request.file.name)
            .mime_str(&request.file.content_type)?;

        let mut form = Form::new().part("file", part);
        if let Some(purpose) = request.purpose {
            form = form.text("purpose", purpose);
        }
        if let Some(image_ref) = request.image_ref {
            form = form.text("ref", image_ref);
        }

        let response = self
            .client
            .http
            .post(self.client.url("images/upload/"))
            .multipart(form)
            .send()
            .await?;

        ApiClient::parse(response).await
    }
}

pub struct OffersApi<'a> {
    client: &'a ApiClient,
}

impl OffersApi<'_> {
    pub async fn browse(&self, filter: Option<&str>) -> Result<Vec<OfferResource>, ApiError> {
        let mut request = self.client.http.get(self.client.url("offers"));
        if let Some(filter) = filter {
            request = request.query(&[("filter", filter)]);
        }

        let envelope: OffersEnvelope<OfferResource> = ApiClient::parse(request.send().await?).await?;
        Ok(envelope.offers)
    }

    pub async fn read(&self, id: Uuid) -> Result<OfferResource, ApiError> {
        let response = self
            .client
            .http
            .get(self.client.url(&format!("offers/{}", id)))
            .send()
            .await?;

        first(ApiClient::parse(response).await?)
    }

    pub async fn add(&self, offer: CreateOfferRequest) -> Result<OfferResource, ApiError> {
        let response = self
            .client
            .http
            .post(self.client.url("offers"))
            .json(&OffersEnvelope::one(offer))
            .send()
            .await?;

        first(ApiClient::parse(response).await?)
    }

    pub async fn edit(&self, id: Uuid, changes: EditOfferRequest) -> Result<OfferResource, ApiError> {
        let response = self
            .client
            .http
            .put(self.client.url(&format!("offers/{}", id)))
            .json(&OffersEnvelope::one(changes))
            .send()
            .await?;

        first(ApiClient::parse(response).await?)
    }
}

fn first(envelope: OffersEnvelope<OfferResource>) -> Result<OfferResource, ApiError> {
    envelope.into_first().ok_or(ApiError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> ApiClient {
        setup_api(&ApiConfig { base_url: server.base_url(), version: "5.0".to_string() }).unwrap()
    }

    fn png() -> ImageFile {
        ImageFile {
            name: "banner.png".to_string(),
            bytes: vec![0x89, b'P', b'N', b'G'],
            content_type: "image/png".to_string(),
        }
    }

    fn offer_json(id: Uuid, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": "Spring",
            "code": "spring",
            "display_title": "",
            "display_description": "",
            "type": "percent",
            "cadence": "month",
            "amount": 20,
            "duration": "once",
            "duration_in_months": null,
            "currency": null,
            "status": status,
            "redemption_count": 4,
            "tier": { "id": Uuid::new_v4(), "name": "Gold" }
        })
    }

    #[tokio::test]
    async fn test_upload_sends_multipart_with_version_header() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(Method::POST)
                .path("/images/upload/")
                .header("accept-version", "v5.0")
                .body_includes("name=\"file\"; filename=\"banner.png\"")
                .body_includes("name=\"purpose\"");
            then.status(201).json_body(json!({
                "images": [{ "url": "https://cdn.example.com/banner.png", "ref": "hero" }]
            }));
        });

        let mut request = ImageUploadRequest::new(png());
        request.purpose = Some("image".to_string());
        let envelope = client(&server).images().upload(request).await.unwrap();

        mock.assert();
        assert_eq!(envelope.images.len(), 1);
        assert_eq!(envelope.images[0].url, "https://cdn.example.com/banner.png");
        assert_eq!(envelope.images[0].image_ref.as_deref(), Some("hero"));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(Method::POST).path("/images/upload/");
            then.status(413).body("too large");
        });

        let err = client(&server)
            .images()
            .upload(ImageUploadRequest::new(png()))
            .await
            .unwrap_err();

        match err {
            ApiError::Status { status, body } => {
                assert_eq!(status, 413);
                assert_eq!(body, "too large");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_browse_passes_filter() {
        let server = MockServer::start_async().await;
        let id = Uuid::new_v4();
        let mock = server.mock(|when, then| {
            when.method(Method::GET)
                .path("/offers")
                .query_param("filter", "status:archived");
            then.status(200).json_body(json!({ "offers": [offer_json(id, "archived")] }));
        });

        let offers = client(&server).offers().browse(Some("status:archived")).await.unwrap();

        mock.assert();
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].id, id);
        assert_eq!(offers[0].redemption_count, 4);
    }

    #[tokio::test]
    async fn test_edit_wraps_changes_in_envelope() {
        let server = MockServer::start_async().await;
        let id = Uuid::new_v4();
        let mock = server.mock(|when, then| {
            when.method(Method::PUT)
                .path(format!("/offers/{}", id))
                .json_body(json!({ "offers": [{ "status": "archived" }] }));
            then.status(200).json_body(json!({ "offers": [offer_json(id, "archived")] }));
        });

        let changes = EditOfferRequest { status: Some("archived".to_string()), ..Default::default() };
        let offer = client(&server).offers().edit(id, changes).await.unwrap();

        mock.assert();
        assert_eq!(offer.status, "archived");
    }

    #[tokio::test]
    async fn test_read_with_empty_envelope_fails() {
        let server = MockServer::start_async().await;
        let id = Uuid::new_v4();
        server.mock(|when, then| {
            when.method(Method::GET).path(format!("/offers/{}", id));
            then.status(200).json_body(json!({ "offers": [] }));
        });

        let err = client(&server).offers().read(id).await.unwrap_err();
        assert!(matches!(err, ApiError::EmptyResponse));
    }

    #[test]
    fn test_setup_requires_version() {
        let result = setup_api(&ApiConfig {
            base_url: "http://localhost:3000".to_string(),
            version: String::new(),
        });
        assert!(matches!(result, Err(ApiError::InvalidConfig(_))));
    }
}
