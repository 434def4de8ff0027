use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tierline_api::{app, AppState};
use tierline_core::{OfferFilter, OfferRepository, PaymentError, RepositoryError};
use tierline_offer::{Offer, OfferStatus};
use tower::ServiceExt;
use uuid::Uuid;

#[derive(Default)]
struct MemoryOffers {
    offers: Mutex<Vec<Offer>>,
    stripe_down: bool,
}

#[async_trait]
impl OfferRepository for MemoryOffers {
    async fn exists_by_name(&self, name: &str) -> Result<bool, RepositoryError> {
        Ok(self.offers.lock().unwrap().iter().any(|o| o.name() == name))
    }

    async fn exists_by_code(&self, code: &str) -> Result<bool, RepositoryError> {
        Ok(self.offers.lock().unwrap().iter().any(|o| o.code() == code))
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Offer>, RepositoryError> {
        Ok(self.offers.lock().unwrap().iter().find(|o| o.id() == id).cloned())
    }

    async fn get_all(&self, filter: &OfferFilter) -> Result<Vec<Offer>, RepositoryError> {
        let status = filter
            .clauses()
            .iter()
            .find(|c| c.field == "status")
            .map(|c| c.value.parse::<OfferStatus>())
            .transpose()?;
        Ok(self
            .offers
            .lock()
            .unwrap()
            .iter()
            .filter(|o| status.map_or(true, |s| o.status() == s))
            .cloned()
            .collect())
    }

    async fn save(&self, offer: &mut Offer) -> Result<(), RepositoryError> {
        if offer.is_new() {
            if self.stripe_down {
                return Err(PaymentError::Provider { status: 503, message: "down".to_string() }.into());
            }
            offer.attach_stripe_coupon_id(format!("co_{}", offer.code()))?;
        }
        offer.mark_persisted();
        let mut offers = self.offers.lock().unwrap();
        offers.retain(|o| o.id() != offer.id());
        offers.push(offer.clone());
        Ok(())
    }
}

fn router(repo: MemoryOffers) -> Router {
    app(AppState { offers: Arc::new(repo) })
}

fn create_body(code: &str) -> Value {
    json!({
        "offers": [{
            "name": format!("Offer {}", code),
            "code": code,
            "display_title": "Half price",
            "type": "fixed",
            "cadence": "month",
            "amount": 500,
            "currency": "usd",
            "duration": "repeating",
            "duration_in_months": 3,
            "tier": { "id": Uuid::new_v4(), "name": "Gold" }
        }]
    })
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

#[tokio::test]
async fn test_add_then_read_offer() {
    let app = router(MemoryOffers::default());

    let (status, body) = send(&app, "POST", "/offers", Some(create_body("spring"))).await;
    assert_eq!(status, StatusCode::CREATED);
    let created = &body["offers"][0];
    assert_eq!(created["code"], "spring");
    assert_eq!(created["type"], "fixed");
    assert_eq!(created["currency"], "usd");
    assert_eq!(created["duration_in_months"], 3);
    assert_eq!(created["status"], "active");
    assert_eq!(created["redemption_count"], 0);

    let id = created["id"].as_str().unwrap();
    let (status, body) = send(&app, "GET", &format!("/offers/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["offers"][0]["name"], "Offer spring");
    assert_eq!(body["offers"][0]["tier"]["name"], "Gold");
}

#[tokio::test]
async fn test_duplicate_code_is_rejected() {
    let app = router(MemoryOffers::default());

    let (status, _) = send(&app, "POST", "/offers", Some(create_body("spring"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let mut body = create_body("spring");
    body["offers"][0]["name"] = json!("Another name");
    let (status, body) = send(&app, "POST", "/offers", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("spring"));
}

#[tokio::test]
async fn test_invalid_offer_is_rejected() {
    let app = router(MemoryOffers::default());

    let mut body = create_body("spring");
    body["offers"][0]["currency"] = Value::Null;
    let (status, _) = send(&app, "POST", "/offers", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let mut body = create_body("spring");
    body["offers"][0]["type"] = json!("amount");
    let (status, _) = send(&app, "POST", "/offers", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let mut body = create_body("spring");
    body["offers"][0]["duration_in_months"] = json!(3_000_000_000u32);
    let (status, body) = send(&app, "POST", "/offers", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("months"));

    let (_, body) = send(&app, "GET", "/offers", None).await;
    assert!(body["offers"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_offer_is_not_found() {
    let app = router(MemoryOffers::default());

    let (status, _) = send(&app, "GET", &format!("/offers/{}", Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_edit_and_browse_by_status() {
    let app = router(MemoryOffers::default());

    let (_, body) = send(&app, "POST", "/offers", Some(create_body("spring"))).await;
    let id = body["offers"][0]["id"].as_str().unwrap().to_string();
    send(&app, "POST", "/offers", Some(create_body("summer"))).await;

    let edit = json!({ "offers": [{ "status": "archived", "code": "spring-old" }] });
    let (status, body) = send(&app, "PUT", &format!("/offers/{}", id), Some(edit)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["offers"][0]["status"], "archived");
    assert_eq!(body["offers"][0]["code"], "spring-old");

    let (status, body) = send(&app, "GET", "/offers?filter=status:archived", None).await;
    assert_eq!(status, StatusCode::OK);
    let offers = body["offers"].as_array().unwrap();
    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0]["id"], id.as_str());

    let (_, body) = send(&app, "GET", "/offers", None).await;
    assert_eq!(body["offers"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_malformed_filter_is_bad_request() {
    let app = router(MemoryOffers::default());

    let (status, _) = send(&app, "GET", "/offers?filter=status", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_payment_failure_is_bad_gateway() {
    let app = router(MemoryOffers { stripe_down: true, ..Default::default() });

    let (status, body) = send(&app, "POST", "/offers", Some(create_body("spring"))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Payment provider error");
}
