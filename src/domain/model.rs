use crate::core::money::parse_decimal_price;
use serde::{Deserialize, Deserializer, Serialize};

/// Cart state as reported by `/cart.js` and `/cart/change.js`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSummary {
    pub item_count: u32,
    #[serde(default)]
    pub total_price: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

/// A cart line as returned by `/cart/add.js`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub variant_id: Option<u64>,
    #[serde(default)]
    pub product_title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Body of `/cart/change.js`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub line: u32,
    pub quantity: u32,
}

impl ChangeRequest {
    pub fn remove(line: u32) -> Self {
        Self { line, quantity: 0 }
    }
}

/// The encoded field set of an add-to-cart form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductForm {
    pub fields: Vec<(String, String)>,
    /// Forms rendered on the cart page submit normally.
    pub in_cart_page: bool,
}

impl ProductForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn for_variant(variant_id: u64, quantity: i64) -> Self {
        Self::new()
            .field("id", variant_id.to_string())
            .field("quantity", quantity.to_string())
    }
}

/// Which control held focus when a product form was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    AddToCart,
    /// The "buy now" button, which goes straight to checkout.
    BuyNow,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductEnvelope {
    pub product: ProductDetails,
}

/// Product JSON as served by `<product-url>.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductDetails {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductVariant {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_minor_units")]
    pub price: Option<i64>,
}

/// Images appear either as bare URLs or as `{ "src": ... }` objects depending on the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    Url(String),
    Object { src: String },
}

impl ImageRef {
    pub fn src(&self) -> &str {
        match self {
            ImageRef::Url(src) | ImageRef::Object { src } => src,
        }
    }
}

/// The product JSON embedded in a product page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PageProduct {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    #[serde(default, deserialize_with = "deserialize_minor_units")]
    pub price: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentlyViewedProduct {
    pub id: u64,
    pub title: String,
    pub url: String,
    pub image: String,
    /// Already formatted for display.
    pub price: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PriceValue {
    MinorUnits(i64),
    Major(f64),
    Text(String),
}

/// Integers are minor units; strings and floats are decimal amounts in major units.
fn deserialize_minor_units<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<PriceValue> = Option::deserialize(deserializer)?;
    Ok(match value {
        None => None,
        Some(PriceValue::MinorUnits(cents)) => Some(cents),
        Some(PriceValue::Major(amount)) => Some((amount * 100.0).round() as i64),
        Some(PriceValue::Text(text)) => parse_decimal_price(&text),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cart_summary_tolerates_missing_fields() {
        let cart: CartSummary = serde_json::from_value(json!({
            "token": "abc",
            "item_count": 3,
            "total_price": 4500,
            "items": [{"id": 1, "title": "Mug", "quantity": 3, "price": 1500}]
        }))
        .unwrap();
        assert_eq!(cart.item_count, 3);
        assert_eq!(cart.total_price, Some(4500));
        assert_eq!(cart.items[0].title, "Mug");

        let bare: CartSummary = serde_json::from_value(json!({"item_count": 0})).unwrap();
        assert_eq!(bare.total_price, None);
        assert!(bare.items.is_empty());
    }

    #[test]
    fn test_variant_prices_accept_cents_and_decimal_strings() {
        let product: ProductEnvelope = serde_json::from_value(json!({
            "product": {
                "title": "Linen Throw",
                "handle": "linen-throw",
                "images": [{"src": "https://cdn.example.com/throw.jpg"}],
                "variants": [{"price": "89.95"}, {"price": 8995}, {"price": null}]
            }
        }))
        .unwrap();
        let variants = &product.product.variants;
        assert_eq!(variants[0].price, Some(8995));
        assert_eq!(variants[1].price, Some(8995));
        assert_eq!(variants[2].price, None);
        assert_eq!(product.product.images[0].src(), "https://cdn.example.com/throw.jpg");
    }

    #[test]
    fn test_page_product_images_as_urls() {
        let product: PageProduct = serde_json::from_value(json!({
            "id": 42,
            "title": "Candle",
            "images": ["//cdn.example.com/candle.jpg"],
            "price": 2500
        }))
        .unwrap();
        assert_eq!(product.images[0].src(), "//cdn.example.com/candle.jpg");
        assert_eq!(product.price, Some(2500));
    }

    #[test]
    fn test_form_for_variant() {
        let form = ProductForm::for_variant(123, 2);
        assert_eq!(
            form.fields,
            vec![
                ("id".to_string(), "123".to_string()),
                ("quantity".to_string(), "2".to_string())
            ]
        );
    }
}
