use crate::core::money::MoneyFormat;
use crate::domain::model::{PageProduct, RecentlyViewedProduct};
use crate::domain::ports::KeyValueStore;
use crate::utils::error::Result;

/// Capped, most-recent-first list of viewed products, deduplicated by id.
pub struct RecentlyViewed<'a, K: KeyValueStore> {
    store: &'a K,
    key: &'a str,
    max_items: usize,
}

impl<'a, K: KeyValueStore> RecentlyViewed<'a, K> {
    pub fn new(store: &'a K, key: &'a str, max_items: usize) -> Self {
        Self {
            store,
            key,
            max_items,
        }
    }

    pub async fn load(&self) -> Result<Vec<RecentlyViewedProduct>> {
        match self.store.get(self.key).await? {
            Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(Vec::new()),
        }
    }

    /// Moves (or inserts) `product` to the front and trims the tail.
    pub async fn record(&self, product: RecentlyViewedProduct) -> Result<Vec<RecentlyViewedProduct>> {
        let mut products = self.load().await?;
        products.retain(|p| p.id != product.id);
        products.insert(0, product);
        products.truncate(self.max_items);

        let encoded = serde_json::to_string(&products)?;
        self.store.set(self.key, &encoded).await?;
        Ok(products)
    }
}

/// Builds the stored entry for a product page; `None` when the page product has no id.
pub fn entry_for_page(
    product: &PageProduct,
    page_path: &str,
    money: &MoneyFormat,
) -> Option<RecentlyViewedProduct> {
    let id = product.id?;
    let image = product
        .featured_image
        .clone()
        .filter(|src| !src.is_empty())
        .or_else(|| product.images.first().map(|img| img.src().to_string()))
        .unwrap_or_default();

    Some(RecentlyViewedProduct {
        id,
        title: product.title.clone(),
        url: page_path.to_string(),
        image,
        price: money.format(product.price.unwrap_or(0)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryStorage;
    use crate::domain::model::ImageRef;

    fn viewed(id: u64) -> RecentlyViewedProduct {
        RecentlyViewedProduct {
            id,
            title: format!("Product {}", id),
            url: format!("/products/p{}", id),
            image: String::new(),
            price: "$1.00".to_string(),
        }
    }

    #[tokio::test]
    async fn test_record_dedupes_and_caps() {
        let storage = MemoryStorage::new();
        let recent = RecentlyViewed::new(&storage, "recentlyViewed", 10);

        for id in 1..=12 {
            recent.record(viewed(id)).await.unwrap();
        }
        let list = recent.record(viewed(5)).await.unwrap();

        assert_eq!(list.len(), 10);
        assert_eq!(list[0].id, 5);
        assert_eq!(list[1].id, 12);
        assert_eq!(list.iter().filter(|p| p.id == 5).count(), 1);
        assert!(!list.iter().any(|p| p.id == 1 || p.id == 2));
        assert_eq!(recent.load().await.unwrap(), list);
    }

    #[tokio::test]
    async fn test_corrupt_stored_list_is_an_error() {
        let storage = MemoryStorage::new();
        storage.set("recentlyViewed", "{oops").await.unwrap();
        let recent = RecentlyViewed::new(&storage, "recentlyViewed", 10);
        assert!(recent.load().await.is_err());
    }

    #[test]
    fn test_entry_prefers_featured_image_then_first_image() {
        let mut product = PageProduct {
            id: Some(7),
            title: "Candle".to_string(),
            featured_image: None,
            images: vec![ImageRef::Url("first.jpg".to_string())],
            price: Some(2500),
        };
        let entry = entry_for_page(&product, "/products/candle", &MoneyFormat::default()).unwrap();
        assert_eq!(entry.image, "first.jpg");
        assert_eq!(entry.price, "$25.00");
        assert_eq!(entry.url, "/products/candle");

        product.featured_image = Some("featured.jpg".to_string());
        let entry = entry_for_page(&product, "/products/candle", &MoneyFormat::default()).unwrap();
        assert_eq!(entry.image, "featured.jpg");

        product.id = None;
        assert!(entry_for_page(&product, "/", &MoneyFormat::default()).is_none());
    }
}
