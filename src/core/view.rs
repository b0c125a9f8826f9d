//! The observable UI state and the reducer that is the only way to change it.
//!
//! A [`ViewStore`] wraps the state in a `watch` channel: every [`Action`] runs under the channel
//! lock, and subscribers are woken only when the reducer reports a change. Fire-and-forget
//! notifications for other components go out on a separate `broadcast` channel as
//! [`StorefrontEvent`]s.

use crate::core::notification::{Notification, NotificationKind};
use crate::core::page::{MobileMenu, ProductGallery, QuickViewContent, QuickViewModal};
use crate::core::quantity::{QuantitySelector, StepDirection};
use crate::core::submit::SubmitControl;
use crate::domain::model::LineItem;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartBadge {
    pub count: u32,
    pub visible: bool,
}

/// A rendered cart row, identified by the line attribute it was rendered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineRow {
    pub line_id: String,
    pub title: String,
    /// Dimmed while a removal is in flight.
    pub dimmed: bool,
    pub interactive: bool,
}

impl CartLineRow {
    pub fn new(line_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            line_id: line_id.into(),
            title: title.into(),
            dimmed: false,
            interactive: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub cart_badge: CartBadge,
    pub subtotal: Option<String>,
    pub cart_lines: Vec<CartLineRow>,
    pub submit_controls: BTreeMap<String, SubmitControl>,
    pub quantities: BTreeMap<String, QuantitySelector>,
    pub notifications: Vec<Notification>,
    pub alert: Option<String>,
    pub reload_requested: bool,
    pub menu: MobileMenu,
    pub gallery: ProductGallery,
    pub quick_view: QuickViewModal,
    /// Index into the product's variant list picked by the option selectors.
    pub selected_variant: Option<usize>,
}

impl ViewState {
    pub fn body_scroll_locked(&self) -> bool {
        self.menu.open || self.quick_view.open
    }

    pub fn line(&self, line_id: &str) -> Option<&CartLineRow> {
        self.cart_lines.iter().find(|row| row.line_id == line_id)
    }

    fn line_mut(&mut self, line_id: &str) -> Option<&mut CartLineRow> {
        self.cart_lines.iter_mut().find(|row| row.line_id == line_id)
    }

    pub fn submit_control(&self, form: &str) -> Option<&SubmitControl> {
        self.submit_controls.get(form)
    }

    pub fn quantity(&self, selector: &str) -> Option<i64> {
        self.quantities.get(selector).map(QuantitySelector::value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    RegisterSubmitControl { form: String, label: String },
    RegisterQuantity { selector: String, quantity: QuantitySelector },
    RegisterCartLine(CartLineRow),
    LoadGallery(ProductGallery),

    SubmitStarted { form: String, adding_label: String },
    SubmitSucceeded { form: String, added_label: String },
    SubmitFailed { form: String },
    SubmitReset { form: String },

    QuantityStepped { selector: String, direction: StepDirection },
    QuantityTyped { selector: String, raw: String },

    CartCountUpdated { item_count: u32 },
    SubtotalUpdated { text: String },
    LineRemovalStarted { line_id: String },
    LineRemovalReverted { line_id: String },
    LineRemoved { line_id: String },
    ReloadRequested,

    NotificationShown(Notification),
    NotificationDismissed { id: u64 },
    AlertRaised { message: String },
    AlertAcknowledged,

    MenuToggled,
    MenuClosed,
    ThumbnailSelected { index: usize },
    VariantSelected { index: Option<usize> },
    QuickViewOpened { product_url: String },
    QuickViewPopulated { product_url: String, content: QuickViewContent },
    QuickViewClosed,
}

/// Applies `action` to `state`; returns whether anything changed.
pub fn reduce(state: &mut ViewState, action: Action) -> bool {
    match action {
        Action::RegisterSubmitControl { form, label } => {
            state.submit_controls.insert(form, SubmitControl::new(label));
            true
        }
        Action::RegisterQuantity { selector, quantity } => {
            state.quantities.insert(selector, quantity);
            true
        }
        Action::RegisterCartLine(row) => {
            state.cart_lines.retain(|existing| existing.line_id != row.line_id);
            state.cart_lines.push(row);
            true
        }
        Action::LoadGallery(gallery) => {
            state.gallery = gallery;
            true
        }

        Action::SubmitStarted { form, adding_label } => state
            .submit_controls
            .get_mut(&form)
            .is_some_and(|control| control.begin(&adding_label)),
        Action::SubmitSucceeded { form, added_label } => state
            .submit_controls
            .get_mut(&form)
            .is_some_and(|control| control.succeed(&added_label)),
        Action::SubmitFailed { form } => state
            .submit_controls
            .get_mut(&form)
            .is_some_and(SubmitControl::fail),
        Action::SubmitReset { form } => state
            .submit_controls
            .get_mut(&form)
            .is_some_and(SubmitControl::reset),

        Action::QuantityStepped { selector, direction } => state
            .quantities
            .get_mut(&selector)
            .and_then(|quantity| quantity.step(direction))
            .is_some(),
        Action::QuantityTyped { selector, raw } => state
            .quantities
            .get_mut(&selector)
            .and_then(|quantity| quantity.set_typed(&raw))
            .is_some(),

        Action::CartCountUpdated { item_count } => {
            let badge = &mut state.cart_badge;
            let before = badge.clone();
            if item_count > 0 {
                badge.count = item_count;
                badge.visible = true;
            } else {
                badge.visible = false;
            }
            *badge != before
        }
        Action::SubtotalUpdated { text } => {
            if state.subtotal.as_deref() == Some(text.as_str()) {
                return false;
            }
            state.subtotal = Some(text);
            true
        }
        Action::LineRemovalStarted { line_id } => match state.line_mut(&line_id) {
            Some(row) if row.interactive => {
                row.dimmed = true;
                row.interactive = false;
                true
            }
            _ => false,
        },
        Action::LineRemovalReverted { line_id } => match state.line_mut(&line_id) {
            Some(row) if row.dimmed || !row.interactive => {
                row.dimmed = false;
                row.interactive = true;
                true
            }
            _ => false,
        },
        Action::LineRemoved { line_id } => {
            let before = state.cart_lines.len();
            state.cart_lines.retain(|row| row.line_id != line_id);
            state.cart_lines.len() != before
        }
        Action::ReloadRequested => {
            if state.reload_requested {
                return false;
            }
            state.reload_requested = true;
            true
        }

        Action::NotificationShown(notification) => {
            state.notifications.push(notification);
            true
        }
        Action::NotificationDismissed { id } => {
            let before = state.notifications.len();
            state.notifications.retain(|n| n.id != id);
            state.notifications.len() != before
        }
        Action::AlertRaised { message } => {
            state.alert = Some(message);
            true
        }
        Action::AlertAcknowledged => state.alert.take().is_some(),

        Action::MenuToggled => state.menu.toggle(),
        Action::MenuClosed => state.menu.close(),
        Action::ThumbnailSelected { index } => state.gallery.select(index),
        Action::VariantSelected { index } => {
            let changed = state.selected_variant != index;
            state.selected_variant = index;
            changed
        }
        Action::QuickViewOpened { product_url } => state.quick_view.open(&product_url),
        Action::QuickViewPopulated {
            product_url,
            content,
        } => state.quick_view.populate(&product_url, content),
        Action::QuickViewClosed => state.quick_view.close(),
    }
}

/// Notifications for interested components; nobody has to be listening.
#[derive(Debug, Clone, PartialEq)]
pub enum StorefrontEvent {
    QuantityChanged { selector: String, value: i64 },
    ItemAdded(LineItem),
    /// The form submits natively, e.g. the buy-now control heading to checkout.
    DefaultSubmission { form: String, to_checkout: bool },
    ReloadRequested,
}

/// Shared handle to the view state. Clones observe and mutate the same state.
#[derive(Debug, Clone)]
pub struct ViewStore {
    state: Arc<watch::Sender<ViewState>>,
    events: broadcast::Sender<StorefrontEvent>,
    next_notification_id: Arc<AtomicU64>,
}

impl Default for ViewStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ViewState::default());
        let (events, _) = broadcast::channel(64);
        Self {
            state: Arc::new(state),
            events,
            next_notification_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Runs the reducer atomically; subscribers are notified only on change.
    pub fn dispatch(&self, action: Action) -> bool {
        tracing::trace!("dispatch {:?}", action);
        self.state.send_if_modified(|state| reduce(state, action))
    }

    pub fn read<R>(&self, f: impl FnOnce(&ViewState) -> R) -> R {
        f(&self.state.borrow())
    }

    pub fn snapshot(&self) -> ViewState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<StorefrontEvent> {
        self.events.subscribe()
    }

    pub fn emit(&self, event: StorefrontEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    /// Dispatches `action` once `delay` has elapsed. Must be called inside a tokio runtime.
    pub fn dispatch_after(&self, delay: Duration, action: Action) {
        let store = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            store.dispatch(action);
        });
    }

    /// Shows a toast and schedules its dismissal.
    pub fn notify(&self, kind: NotificationKind, message: impl Into<String>, duration: Duration) -> u64 {
        let id = self.next_notification_id.fetch_add(1, Ordering::Relaxed);
        self.dispatch(Action::NotificationShown(Notification {
            id,
            kind,
            message: message.into(),
        }));
        self.dispatch_after(duration, Action::NotificationDismissed { id });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::quantity::QuantityBounds;

    fn state_with_line(line_id: &str) -> ViewState {
        let mut state = ViewState::default();
        reduce(&mut state, Action::RegisterCartLine(CartLineRow::new(line_id, "Mug")));
        state
    }

    #[test]
    fn test_badge_hidden_at_zero_keeps_last_count() {
        let mut state = ViewState::default();
        assert!(reduce(&mut state, Action::CartCountUpdated { item_count: 3 }));
        assert_eq!(state.cart_badge, CartBadge { count: 3, visible: true });
        assert!(!reduce(&mut state, Action::CartCountUpdated { item_count: 3 }));
        assert!(reduce(&mut state, Action::CartCountUpdated { item_count: 0 }));
        assert_eq!(state.cart_badge, CartBadge { count: 3, visible: false });
    }

    #[test]
    fn test_line_removal_dims_then_reverts() {
        let mut state = state_with_line("2");
        assert!(reduce(&mut state, Action::LineRemovalStarted { line_id: "2".into() }));
        assert!(state.line("2").unwrap().dimmed);
        assert!(!reduce(&mut state, Action::LineRemovalStarted { line_id: "2".into() }));

        assert!(reduce(&mut state, Action::LineRemovalReverted { line_id: "2".into() }));
        assert_eq!(state.line("2"), Some(&CartLineRow::new("2", "Mug")));
    }

    #[test]
    fn test_line_removed_only_touches_target() {
        let mut state = state_with_line("1");
        reduce(&mut state, Action::RegisterCartLine(CartLineRow::new("2", "Bowl")));
        assert!(reduce(&mut state, Action::LineRemoved { line_id: "1".into() }));
        assert_eq!(state.cart_lines, vec![CartLineRow::new("2", "Bowl")]);
        assert!(!reduce(&mut state, Action::LineRemoved { line_id: "1".into() }));
    }

    #[test]
    fn test_quantity_step_outside_bounds_reports_no_change() {
        let mut state = ViewState::default();
        reduce(
            &mut state,
            Action::RegisterQuantity {
                selector: "main".into(),
                quantity: QuantitySelector::new(99, QuantityBounds::default()),
            },
        );
        assert!(!reduce(
            &mut state,
            Action::QuantityStepped {
                selector: "main".into(),
                direction: StepDirection::Increment
            }
        ));
        assert_eq!(state.quantity("main"), Some(99));
    }

    #[test]
    fn test_body_scroll_lock_follows_menu_and_modal() {
        let mut state = ViewState::default();
        reduce(&mut state, Action::MenuToggled);
        assert!(state.body_scroll_locked());
        reduce(&mut state, Action::QuickViewOpened { product_url: "/products/a".into() });
        reduce(&mut state, Action::MenuClosed);
        assert!(state.body_scroll_locked());
        reduce(&mut state, Action::QuickViewClosed);
        assert!(!state.body_scroll_locked());
    }

    #[tokio::test]
    async fn test_subscribers_only_see_real_changes() {
        let store = ViewStore::new();
        let mut rx = store.subscribe();

        assert!(!store.dispatch(Action::MenuClosed));
        assert!(!rx.has_changed().unwrap());

        assert!(store.dispatch(Action::MenuToggled));
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().menu.open);
    }

    #[tokio::test]
    async fn test_notification_is_dismissed_after_duration() {
        let store = ViewStore::new();
        let id = store.notify(NotificationKind::Info, "Saved", Duration::from_millis(20));
        assert_eq!(store.read(|s| s.notifications.len()), 1);
        assert_eq!(store.read(|s| s.notifications[0].id), id);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(store.read(|s| s.notifications.is_empty()));
    }
}
