use crate::domain::model::{CartSummary, ChangeRequest, LineItem, ProductDetails, ProductForm};
use crate::utils::error::Result;
use async_trait::async_trait;

/// The storefront's cart endpoints. The remote cart is the source of truth; nothing is cached.
#[async_trait]
pub trait CartService: Send + Sync {
    /// `POST /cart/add.js` with the form's fields.
    async fn add(&self, form: &ProductForm) -> Result<LineItem>;
    /// `POST /cart/change.js` with a JSON body.
    async fn change(&self, request: ChangeRequest) -> Result<CartSummary>;
    /// `GET /cart.js`
    async fn cart(&self) -> Result<CartSummary>;
    /// `GET <product_url>.json`
    async fn product(&self, product_url: &str) -> Result<ProductDetails>;
}

/// String key/value persistence, the local-storage analogue.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> impl std::future::Future<Output = Result<Option<String>>> + Send;
    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
