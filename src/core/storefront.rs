use crate::config::StorefrontConfig;
use crate::core::notification::{ErrorSurface, NotificationKind};
use crate::core::page::{match_variant, ProductGallery, QuickViewContent};
use crate::core::quantity::{parse_leading_int, QuantitySelector, StepDirection};
use crate::core::recently_viewed::{entry_for_page, RecentlyViewed};
use crate::core::submit::SubmitState;
use crate::core::view::{Action, CartLineRow, StorefrontEvent, ViewStore};
use crate::domain::model::{
    CartSummary, ChangeRequest, FocusTarget, LineItem, PageProduct, ProductForm,
    RecentlyViewedProduct,
};
use crate::domain::ports::{CartService, KeyValueStore};
use crate::utils::error::{CartError, Result};

/// What happened to a product form submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The form lives on the cart page and is left alone.
    NotEngaged,
    /// The native submission goes ahead (buy-now, or no submit control registered).
    DefaultSubmission,
    /// The control was not idle; nothing was sent.
    Ignored,
    Added(LineItem),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemovalOutcome {
    /// The cart is empty now and the page should reload.
    CartEmptied,
    LineRemoved(CartSummary),
    /// The row already has a removal in flight.
    Ignored,
}

/// The cart interaction controller.
///
/// Every handler re-reads the current view state through the [`ViewStore`] rather than holding
/// on to anything captured earlier, so completions arriving in any order see current state.
pub struct Storefront<C: CartService, K: KeyValueStore> {
    service: C,
    storage: K,
    config: StorefrontConfig,
    view: ViewStore,
    /// Held across the load and store of the recently-viewed list.
    recently_viewed_lock: tokio::sync::Mutex<()>,
}

impl<C: CartService, K: KeyValueStore> Storefront<C, K> {
    pub fn new(service: C, storage: K, config: StorefrontConfig) -> Self {
        Self {
            service,
            storage,
            config,
            view: ViewStore::new(),
            recently_viewed_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn view(&self) -> &ViewStore {
        &self.view
    }

    pub fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    pub fn format_money(&self, minor_units: i64) -> String {
        self.config.money.format(minor_units)
    }

    // Page setup

    pub fn register_product_form(&self, form: &str, submit_label: &str) {
        self.view.dispatch(Action::RegisterSubmitControl {
            form: form.to_string(),
            label: submit_label.to_string(),
        });
    }

    /// Registers a stepper from its input's raw `value`, `min` and `max` attributes.
    pub fn register_quantity_selector(
        &self,
        selector: &str,
        value: &str,
        min: Option<&str>,
        max: Option<&str>,
    ) -> i64 {
        let quantity = QuantitySelector::from_attributes(value, min, max, self.config.quantity);
        let value = quantity.value();
        self.view.dispatch(Action::RegisterQuantity {
            selector: selector.to_string(),
            quantity,
        });
        value
    }

    pub fn register_cart_line(&self, line_id: &str, title: &str) {
        self.view
            .dispatch(Action::RegisterCartLine(CartLineRow::new(line_id, title)));
    }

    pub fn load_gallery(&self, gallery: ProductGallery) {
        self.view.dispatch(Action::LoadGallery(gallery));
    }

    // Quantity steppers

    pub fn increment_quantity(&self, selector: &str) -> Result<Option<i64>> {
        self.step_quantity(selector, StepDirection::Increment)
    }

    pub fn decrement_quantity(&self, selector: &str) -> Result<Option<i64>> {
        self.step_quantity(selector, StepDirection::Decrement)
    }

    /// Applies a step; `Ok(None)` means the step would have left the bounds.
    pub fn step_quantity(&self, selector: &str, direction: StepDirection) -> Result<Option<i64>> {
        self.ensure_quantity(selector)?;
        let changed = self.view.dispatch(Action::QuantityStepped {
            selector: selector.to_string(),
            direction,
        });
        Ok(self.quantity_changed(selector, changed))
    }

    /// Typed input, clamped into the stepper's bounds.
    pub fn type_quantity(&self, selector: &str, raw: &str) -> Result<Option<i64>> {
        self.ensure_quantity(selector)?;
        let changed = self.view.dispatch(Action::QuantityTyped {
            selector: selector.to_string(),
            raw: raw.to_string(),
        });
        Ok(self.quantity_changed(selector, changed))
    }

    fn ensure_quantity(&self, selector: &str) -> Result<()> {
        if self.view.read(|s| s.quantities.contains_key(selector)) {
            Ok(())
        } else {
            Err(CartError::UnknownElementError {
                kind: "quantity selector",
                id: selector.to_string(),
            })
        }
    }

    fn quantity_changed(&self, selector: &str, changed: bool) -> Option<i64> {
        if !changed {
            return None;
        }
        let value = self.view.read(|s| s.quantity(selector))?;
        tracing::debug!("Quantity '{}' changed to {}", selector, value);
        self.view.emit(StorefrontEvent::QuantityChanged {
            selector: selector.to_string(),
            value,
        });
        Some(value)
    }

    // Add to cart

    /// Submits a product form through the cart API.
    ///
    /// On failure the control is already back to idle with its original label and the error has
    /// been surfaced to the user when the error is returned.
    pub async fn submit_product_form(
        &self,
        form_id: &str,
        form: &ProductForm,
        focus: FocusTarget,
    ) -> Result<SubmitOutcome> {
        if form.in_cart_page {
            return Ok(SubmitOutcome::NotEngaged);
        }

        let has_control = self.view.read(|s| s.submit_control(form_id).is_some());
        if !has_control || focus == FocusTarget::BuyNow {
            tracing::debug!("Form '{}' submits natively", form_id);
            self.view.emit(StorefrontEvent::DefaultSubmission {
                form: form_id.to_string(),
                to_checkout: focus == FocusTarget::BuyNow,
            });
            return Ok(SubmitOutcome::DefaultSubmission);
        }

        let started = self.view.dispatch(Action::SubmitStarted {
            form: form_id.to_string(),
            adding_label: self.config.copy.adding.clone(),
        });
        if !started {
            tracing::debug!("Form '{}' is busy, ignoring submission", form_id);
            return Ok(SubmitOutcome::Ignored);
        }

        tracing::info!("Adding to cart from form '{}'", form_id);
        match self.service.add(form).await {
            Ok(item) => {
                self.on_add_succeeded(form_id, &item).await;
                Ok(SubmitOutcome::Added(item))
            }
            Err(e) => {
                self.on_add_failed(form_id, &e);
                Err(e)
            }
        }
    }

    async fn on_add_succeeded(&self, form_id: &str, item: &LineItem) {
        tracing::info!("Added '{}' (id {}) to cart", item.title, item.id);
        self.view.dispatch(Action::SubmitSucceeded {
            form: form_id.to_string(),
            added_label: self.config.copy.added.clone(),
        });

        self.view.dispatch_after(
            self.config.success_reset(),
            Action::SubmitReset {
                form: form_id.to_string(),
            },
        );

        if self.config.notifications.success_toast {
            self.view.notify(
                NotificationKind::Success,
                self.config.copy.added_to_cart.clone(),
                self.config.notification_duration(),
            );
        }
        self.view.emit(StorefrontEvent::ItemAdded(item.clone()));

        // The reset timer is already running; a slow count refresh does not hold the control.
        if let Err(e) = self.refresh_cart_count().await {
            tracing::warn!("Cart count refresh after add failed: {}", e);
        }
    }

    fn on_add_failed(&self, form_id: &str, error: &CartError) {
        tracing::error!(
            "Add to cart from form '{}' failed: {} (category: {:?})",
            form_id,
            error,
            error.category()
        );
        self.view.dispatch(Action::SubmitFailed {
            form: form_id.to_string(),
        });
        self.surface_error(self.config.copy.add_error.clone());
    }

    fn surface_error(&self, message: String) {
        match self.config.notifications.error_surface {
            ErrorSurface::Toast => {
                self.view.notify(
                    NotificationKind::Error,
                    message,
                    self.config.notification_duration(),
                );
            }
            ErrorSurface::Alert => {
                self.view.dispatch(Action::AlertRaised { message });
            }
        }
    }

    pub fn acknowledge_alert(&self) -> bool {
        self.view.dispatch(Action::AlertAcknowledged)
    }

    pub fn submit_state(&self, form_id: &str) -> Option<SubmitState> {
        self.view
            .read(|s| s.submit_control(form_id).map(|control| control.state()))
    }

    // Cart count

    /// Re-reads the cart and updates the count badge. Safe to call redundantly.
    pub async fn refresh_cart_count(&self) -> Result<CartSummary> {
        let cart = self.service.cart().await.inspect_err(|e| {
            tracing::warn!("Fetching cart for count badge failed: {}", e);
        })?;
        tracing::debug!("Cart holds {} items", cart.item_count);
        self.view.dispatch(Action::CartCountUpdated {
            item_count: cart.item_count,
        });
        Ok(cart)
    }

    // Line removal

    /// Removes a cart line, dimming its row while the request is in flight.
    pub async fn remove_line(&self, line_id: &str) -> Result<RemovalOutcome> {
        let line = parse_leading_int(line_id)
            .filter(|line| *line >= 1)
            .and_then(|line| u32::try_from(line).ok())
            .ok_or_else(|| CartError::InvalidLineError {
                value: line_id.to_string(),
            })?;

        let tracked = self.view.read(|s| s.line(line_id).is_some());
        if tracked
            && !self.view.dispatch(Action::LineRemovalStarted {
                line_id: line_id.to_string(),
            })
        {
            return Ok(RemovalOutcome::Ignored);
        }

        tracing::info!("Removing cart line {}", line);
        let cart = match self.service.change(ChangeRequest::remove(line)).await {
            Ok(cart) => cart,
            Err(e) => {
                tracing::error!("Removing cart line {} failed: {}", line, e);
                self.view.dispatch(Action::LineRemovalReverted {
                    line_id: line_id.to_string(),
                });
                return Err(e);
            }
        };

        if cart.item_count == 0 {
            tracing::info!("Cart is empty, requesting reload");
            self.view.dispatch(Action::ReloadRequested);
            self.view.emit(StorefrontEvent::ReloadRequested);
            return Ok(RemovalOutcome::CartEmptied);
        }

        self.view.dispatch(Action::LineRemoved {
            line_id: line_id.to_string(),
        });
        if let Some(total) = cart.total_price {
            self.view.dispatch(Action::SubtotalUpdated {
                text: self.format_money(total),
            });
        }
        if let Err(e) = self.refresh_cart_count().await {
            tracing::warn!("Cart count refresh after removal failed: {}", e);
        }

        Ok(RemovalOutcome::LineRemoved(cart))
    }

    // Recently viewed

    /// Records a product page view from the page's embedded product JSON.
    /// Returns the stored entry, or `None` if the product has no id.
    pub async fn track_product_view(
        &self,
        product_json: &str,
        page_path: &str,
    ) -> Result<Option<RecentlyViewedProduct>> {
        let product: PageProduct = serde_json::from_str(product_json).inspect_err(|e| {
            tracing::error!("Error tracking product: {}", e);
        })?;

        let Some(entry) = entry_for_page(&product, page_path, &self.config.money) else {
            return Ok(None);
        };

        {
            let _guard = self.recently_viewed_lock.lock().await;
            self.recently_viewed_list().record(entry.clone()).await?;
        }
        tracing::debug!("Tracked view of product {}", entry.id);
        Ok(Some(entry))
    }

    pub async fn recently_viewed(&self) -> Result<Vec<RecentlyViewedProduct>> {
        self.recently_viewed_list().load().await
    }

    fn recently_viewed_list(&self) -> RecentlyViewed<'_, K> {
        RecentlyViewed::new(
            &self.storage,
            &self.config.recently_viewed.storage_key,
            self.config.recently_viewed.max_items,
        )
    }

    // Quick view

    /// Opens the quick-view modal and loads the product into it.
    /// On failure the modal stays open in its loading state.
    pub async fn open_quick_view(&self, product_url: &str) -> Result<QuickViewContent> {
        self.view.dispatch(Action::QuickViewOpened {
            product_url: product_url.to_string(),
        });

        let product = self.service.product(product_url).await.inspect_err(|e| {
            tracing::error!("Error loading product {}: {}", product_url, e);
        })?;

        let price = product
            .variants
            .first()
            .and_then(|variant| variant.price)
            .unwrap_or(0);
        let content = QuickViewContent {
            title: product.title.clone(),
            image_src: product.images.first().map(|img| img.src().to_string()),
            price: self.format_money(price),
            link: format!("/products/{}", product.handle),
        };

        self.view.dispatch(Action::QuickViewPopulated {
            product_url: product_url.to_string(),
            content: content.clone(),
        });
        Ok(content)
    }

    pub fn close_quick_view(&self) -> bool {
        self.view.dispatch(Action::QuickViewClosed)
    }

    // Page chrome

    pub fn toggle_menu(&self) -> bool {
        self.view.dispatch(Action::MenuToggled);
        self.view.read(|s| s.menu.open)
    }

    pub fn click_outside_menu(&self) -> bool {
        self.view.dispatch(Action::MenuClosed)
    }

    /// Escape closes whichever of the menu and the quick-view modal is open.
    pub fn press_escape(&self) -> bool {
        let menu_closed = self.view.dispatch(Action::MenuClosed);
        let modal_closed = self.view.dispatch(Action::QuickViewClosed);
        menu_closed || modal_closed
    }

    pub fn select_thumbnail(&self, index: usize) -> bool {
        self.view.dispatch(Action::ThumbnailSelected { index })
    }

    /// Picks the variant matching the current option selections. No match clears the selection.
    pub fn select_variant<S: AsRef<str>>(
        &self,
        selected_options: &[S],
        variant_titles: &[S],
    ) -> Option<usize> {
        let index = match_variant(selected_options, variant_titles);
        if index.is_none() {
            tracing::debug!("No variant matches the selected options");
        }
        self.view.dispatch(Action::VariantSelected { index });
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryStorage;
    use crate::core::page::Thumbnail;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted cart service: responses are popped in order.
    #[derive(Default)]
    struct ScriptedCart {
        add_results: Mutex<Vec<Result<LineItem>>>,
        change_results: Mutex<Vec<Result<CartSummary>>>,
        cart_count: Mutex<u32>,
        cart_calls: AtomicUsize,
    }

    #[async_trait]
    impl CartService for ScriptedCart {
        async fn add(&self, _form: &ProductForm) -> Result<LineItem> {
            self.add_results.lock().unwrap().remove(0)
        }

        async fn change(&self, _request: ChangeRequest) -> Result<CartSummary> {
            self.change_results.lock().unwrap().remove(0)
        }

        async fn cart(&self) -> Result<CartSummary> {
            self.cart_calls.fetch_add(1, Ordering::SeqCst);
            Ok(CartSummary {
                item_count: *self.cart_count.lock().unwrap(),
                total_price: None,
                currency: None,
                items: vec![],
            })
        }

        async fn product(&self, product_url: &str) -> Result<crate::domain::model::ProductDetails> {
            Err(CartError::UnknownElementError {
                kind: "product",
                id: product_url.to_string(),
            })
        }
    }

    fn storefront(service: ScriptedCart) -> Storefront<ScriptedCart, MemoryStorage> {
        Storefront::new(service, MemoryStorage::new(), StorefrontConfig::default())
    }

    fn line_item() -> LineItem {
        LineItem {
            id: 11,
            title: "Mug".to_string(),
            quantity: Some(1),
            price: Some(1500),
            variant_id: None,
            product_title: None,
            url: None,
            image: None,
        }
    }

    #[test]
    fn test_quantity_plus_at_max_fires_no_event() {
        let shop = storefront(ScriptedCart::default());
        shop.register_quantity_selector("qty", "99", None, Some("99"));
        let mut events = shop.view().subscribe_events();

        assert_eq!(shop.increment_quantity("qty").unwrap(), None);
        assert_eq!(shop.view().read(|s| s.quantity("qty")), Some(99));
        assert!(events.try_recv().is_err());

        assert_eq!(shop.decrement_quantity("qty").unwrap(), Some(98));
        assert_eq!(
            events.try_recv().unwrap(),
            StorefrontEvent::QuantityChanged {
                selector: "qty".to_string(),
                value: 98
            }
        );
    }

    #[test]
    fn test_unknown_selector_is_an_error() {
        let shop = storefront(ScriptedCart::default());
        assert!(matches!(
            shop.increment_quantity("nope"),
            Err(CartError::UnknownElementError { .. })
        ));
    }

    #[tokio::test]
    async fn test_buy_now_and_cart_page_forms_are_not_intercepted() {
        let shop = storefront(ScriptedCart::default());
        shop.register_product_form("product", "Add to cart");
        let form = ProductForm::for_variant(1, 1);

        let outcome = shop
            .submit_product_form("product", &form, FocusTarget::BuyNow)
            .await
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::DefaultSubmission);
        assert_eq!(shop.submit_state("product"), Some(SubmitState::Idle));

        let mut cart_page_form = form.clone();
        cart_page_form.in_cart_page = true;
        let outcome = shop
            .submit_product_form("product", &cart_page_form, FocusTarget::AddToCart)
            .await
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::NotEngaged);
    }

    #[tokio::test]
    async fn test_add_success_then_failure_cycle() {
        let service = ScriptedCart::default();
        *service.add_results.lock().unwrap() = vec![
            Ok(line_item()),
            Err(CartError::RejectedError {
                endpoint: "/cart/add.js".to_string(),
                status: 422,
                message: "Sold out".to_string(),
            }),
        ];
        *service.cart_count.lock().unwrap() = 1;

        let mut config = StorefrontConfig::default();
        config.timing.success_reset_ms = 10;
        let shop = Storefront::new(service, MemoryStorage::new(), config);
        shop.register_product_form("product", "Add to cart");
        let form = ProductForm::for_variant(1, 1);

        let outcome = shop
            .submit_product_form("product", &form, FocusTarget::AddToCart)
            .await
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::Added(line_item()));
        assert_eq!(shop.submit_state("product"), Some(SubmitState::Succeeded));

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert_eq!(shop.submit_state("product"), Some(SubmitState::Idle));

        assert!(shop
            .submit_product_form("product", &form, FocusTarget::AddToCart)
            .await
            .is_err());
        let control = shop.view().read(|s| s.submit_control("product").cloned()).unwrap();
        assert_eq!(control.label(), "Add to cart");
        assert!(control.is_enabled());
        assert_eq!(shop.service.cart_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_alert_surface_blocks_until_acknowledged() {
        let service = ScriptedCart::default();
        *service.add_results.lock().unwrap() = vec![Err(CartError::InvalidLineError {
            value: "x".to_string(),
        })];
        let mut config = StorefrontConfig::default();
        config.notifications.error_surface = ErrorSurface::Alert;
        let shop = Storefront::new(service, MemoryStorage::new(), config);
        shop.register_product_form("product", "Add to cart");

        let _ = shop
            .submit_product_form("product", &ProductForm::for_variant(1, 1), FocusTarget::AddToCart)
            .await;

        assert_eq!(
            shop.view().read(|s| s.alert.clone()).as_deref(),
            Some("An error occurred. Please try again.")
        );
        assert!(shop.view().read(|s| s.notifications.is_empty()));
        assert!(shop.acknowledge_alert());
        assert!(shop.view().read(|s| s.alert.is_none()));
    }

    #[tokio::test]
    async fn test_remove_line_rejects_non_numeric_identifier() {
        let shop = storefront(ScriptedCart::default());
        shop.register_cart_line("abc", "Mug");
        assert!(matches!(
            shop.remove_line("abc").await,
            Err(CartError::InvalidLineError { .. })
        ));
        assert!(!shop.view().read(|s| s.line("abc").unwrap().dimmed));
    }

    #[tokio::test]
    async fn test_escape_closes_menu_and_modal() {
        let shop = storefront(ScriptedCart::default());
        assert!(!shop.press_escape());
        assert!(shop.toggle_menu());
        assert!(shop.view().read(|s| s.body_scroll_locked()));
        assert!(shop.open_quick_view("/products/a").await.is_err());
        assert!(shop.view().read(|s| s.quick_view.is_loading()));

        assert!(shop.press_escape());
        let state = shop.view().snapshot();
        assert!(!state.menu.open);
        assert!(!state.quick_view.open);
        assert!(!state.body_scroll_locked());
    }

    #[test]
    fn test_select_thumbnail() {
        let shop = storefront(ScriptedCart::default());
        shop.load_gallery(ProductGallery::new(
            Some("main.jpg".to_string()),
            vec![Thumbnail {
                image: Some("side.jpg".to_string()),
            }],
        ));
        assert!(shop.select_thumbnail(0));
        assert_eq!(
            shop.view().read(|s| s.gallery.main_image.clone()).as_deref(),
            Some("side.jpg")
        );
    }

    #[test]
    fn test_select_variant_stores_matched_index() {
        let shop = storefront(ScriptedCart::default());
        let titles = ["Small / Red", "Large / Blue", "Large / Red"];

        assert_eq!(shop.select_variant(&["Large", "Red"], &titles), Some(2));
        assert_eq!(shop.view().read(|s| s.selected_variant), Some(2));

        assert_eq!(shop.select_variant(&["Blue"], &titles), Some(1));
        assert_eq!(shop.view().read(|s| s.selected_variant), Some(1));

        assert_eq!(shop.select_variant(&["Medium"], &titles), None);
        assert_eq!(shop.view().read(|s| s.selected_variant), None);
    }

    #[tokio::test]
    async fn test_track_product_view_skips_products_without_id() {
        let shop = storefront(ScriptedCart::default());
        let tracked = shop
            .track_product_view(r#"{"title": "Gift card"}"#, "/products/gift-card")
            .await
            .unwrap();
        assert!(tracked.is_none());
        assert!(shop.recently_viewed().await.unwrap().is_empty());
        assert!(shop.track_product_view("not json", "/").await.is_err());
    }
}
