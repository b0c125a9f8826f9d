pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::StorefrontConfig;

pub use adapters::{HttpCartService, LocalStorage, MemoryStorage};
pub use crate::core::money::MoneyFormat;
pub use crate::core::storefront::{RemovalOutcome, Storefront, SubmitOutcome};
pub use crate::core::view::{StorefrontEvent, ViewState, ViewStore};
pub use domain::model::{FocusTarget, ProductForm};
pub use utils::error::{CartError, Result};
