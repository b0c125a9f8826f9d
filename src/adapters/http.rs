use crate::config::StorefrontConfig;
use crate::domain::model::{
    CartSummary, ChangeRequest, LineItem, ProductDetails, ProductEnvelope, ProductForm,
};
use crate::domain::ports::CartService;
use crate::utils::error::{CartError, Result};
use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;
use url::Url;

/// [`CartService`] over the storefront's AJAX cart API.
pub struct HttpCartService {
    client: Client,
    base_url: Url,
    cart_add: String,
    cart_change: String,
    cart: String,
}

impl HttpCartService {
    pub fn new(config: &StorefrontConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url()).map_err(|e| CartError::InvalidConfigValueError {
            field: "storefront.base_url".to_string(),
            value: config.base_url().to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url,
            cart_add: config.endpoints.cart_add.clone(),
            cart_change: config.endpoints.cart_change.clone(),
            cart: config.endpoints.cart.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| CartError::InvalidConfigValueError {
                field: "endpoint".to_string(),
                value: path.to_string(),
                reason: format!("Cannot join onto base URL: {}", e),
            })
    }

    /// Reads the body as JSON. Non-2xx statuses become [`CartError::RejectedError`], carrying the
    /// store's `description` or `message` when it sent one.
    async fn read_json<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T> {
        let status = response.status();
        tracing::debug!("{} responded with status {}", endpoint, status);

        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| {
                    v.get("description")
                        .or_else(|| v.get("message"))
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());
            return Err(CartError::RejectedError {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|source| CartError::MalformedResponse {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

#[async_trait]
impl CartService for HttpCartService {
    async fn add(&self, form: &ProductForm) -> Result<LineItem> {
        let url = self.endpoint(&self.cart_add)?;
        tracing::debug!("POST {} with {} form fields", url, form.fields.len());

        let response = self
            .client
            .post(url)
            .header(header::ACCEPT, "application/json")
            .form(&form.fields)
            .send()
            .await?;

        Self::read_json(&self.cart_add, response).await
    }

    async fn change(&self, request: ChangeRequest) -> Result<CartSummary> {
        let url = self.endpoint(&self.cart_change)?;
        tracing::debug!("POST {} line={} quantity={}", url, request.line, request.quantity);

        let response = self
            .client
            .post(url)
            .header(header::ACCEPT, "application/json")
            .json(&request)
            .send()
            .await?;

        Self::read_json(&self.cart_change, response).await
    }

    async fn cart(&self) -> Result<CartSummary> {
        let url = self.endpoint(&self.cart)?;
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        Self::read_json(&self.cart, response).await
    }

    async fn product(&self, product_url: &str) -> Result<ProductDetails> {
        let path = format!("{}.json", product_url.trim_end_matches('/'));
        let url = self.endpoint(&path)?;
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let envelope: ProductEnvelope = Self::read_json(&path, response).await?;
        Ok(envelope.product)
    }
}
