pub mod money;
pub mod notification;
pub mod page;
pub mod quantity;
pub mod recently_viewed;
pub mod storefront;
pub mod submit;
pub mod view;

pub use crate::domain::model::{CartSummary, FocusTarget, LineItem, ProductForm};
pub use crate::domain::ports::{CartService, KeyValueStore};
pub use crate::utils::error::Result;
