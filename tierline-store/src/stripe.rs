use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tierline_core::{Coupon, CouponParams, PaymentAdapter, PaymentError};
use tracing::{debug, error};

use crate::app_config::StripeConfig;

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: String,
}

/// Stripe coupon endpoints over form-encoded HTTP.
#[derive(Clone)]
pub struct StripeCouponClient {
    http: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl StripeCouponClient {
    pub fn new(config: &StripeConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            secret_key: config.secret_key.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.api_base, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, PaymentError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<StripeErrorBody>(&body)
            .map(|b| b.error.message)
            .unwrap_or(body);
        error!("Stripe request failed with {}: {}", status, message);

        Err(PaymentError::Provider { status: status.as_u16(), message })
    }
}

fn transport(err: reqwest::Error) -> PaymentError {
    PaymentError::Transport(Box::new(err))
}

#[async_trait]
impl PaymentAdapter for StripeCouponClient {
    async fn create_coupon(&self, params: &CouponParams) -> Result<Coupon, PaymentError> {
        debug!("Creating Stripe coupon '{}'", params.name);
        let response = self
            .http
            .post(self.url("coupons"))
            .bearer_auth(&self.secret_key)
            .form(params)
            .send()
            .await
            .map_err(transport)?;

        Self::check(response).await?.json::<Coupon>().await.map_err(transport)
    }

    async fn delete_coupon(&self, coupon_id: &str) -> Result<(), PaymentError> {
        debug!("Deleting Stripe coupon {}", coupon_id);
        let response = self
            .http
            .delete(self.url(&format!("coupons/{}", coupon_id)))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(transport)?;

        Self::check(response).await?;
        Ok(())
    }
}
