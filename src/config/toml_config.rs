use crate::core::money::MoneyFormat;
use crate::core::notification::ErrorSurface;
use crate::core::quantity::QuantityBounds;
use crate::utils::error::{CartError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Locale and policy configuration for one storefront deployment.
///
/// `Default` is the Australian English theme: `$` prefixed amounts, steppers bounded to 1..=99,
/// toast notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorefrontConfig {
    pub storefront: StorefrontSection,
    #[serde(default)]
    pub endpoints: EndpointConfig,
    #[serde(default)]
    pub quantity: QuantityBounds,
    #[serde(default)]
    pub money: MoneyFormat,
    #[serde(default)]
    pub copy: CopyConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub recently_viewed: RecentlyViewedConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorefrontSection {
    pub base_url: String,
    pub locale: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub cart_add: String,
    pub cart_change: String,
    pub cart: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            cart_add: "/cart/add.js".to_string(),
            cart_change: "/cart/change.js".to_string(),
            cart: "/cart.js".to_string(),
        }
    }
}

/// User-facing strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyConfig {
    pub adding: String,
    pub added: String,
    pub added_to_cart: String,
    pub add_error: String,
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            adding: "Adding...".to_string(),
            added: "Added ✓".to_string(),
            added_to_cart: "Added to cart!".to_string(),
            add_error: "An error occurred. Please try again.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub error_surface: ErrorSurface,
    pub success_toast: bool,
    pub duration_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            error_surface: ErrorSurface::Toast,
            success_toast: true,
            duration_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// How long the "added" label stays before the button resets.
    pub success_reset_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            success_reset_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecentlyViewedConfig {
    pub storage_key: String,
    pub max_items: usize,
}

impl Default for RecentlyViewedConfig {
    fn default() -> Self {
        Self {
            storage_key: "recentlyViewed".to_string(),
            max_items: 10,
        }
    }
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self::for_base_url("http://127.0.0.1:9292")
    }
}

impl StorefrontConfig {
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        Self {
            storefront: StorefrontSection {
                base_url: base_url.into(),
                locale: Some("en-AU".to_string()),
                timeout_seconds: None,
            },
            endpoints: EndpointConfig::default(),
            quantity: QuantityBounds::default(),
            money: MoneyFormat::default(),
            copy: CopyConfig::default(),
            notifications: NotificationConfig::default(),
            timing: TimingConfig::default(),
            recently_viewed: RecentlyViewedConfig::default(),
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CartError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| CartError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` references with environment values; unset variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CartError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// `STOREFRONT_BASE_URL` wins over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(base_url) = std::env::var("STOREFRONT_BASE_URL") {
            tracing::debug!("Base URL overridden from environment: {}", base_url);
            self.storefront.base_url = base_url;
        }
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("storefront.base_url", &self.storefront.base_url)?;

        if let Some(timeout) = self.storefront.timeout_seconds {
            validation::validate_positive_number("storefront.timeout_seconds", timeout as usize, 1)?;
        }

        validation::validate_endpoint_path("endpoints.cart_add", &self.endpoints.cart_add)?;
        validation::validate_endpoint_path("endpoints.cart_change", &self.endpoints.cart_change)?;
        validation::validate_endpoint_path("endpoints.cart", &self.endpoints.cart)?;

        if let Some(max) = self.quantity.max {
            if max < self.quantity.min {
                return Err(CartError::InvalidConfigValueError {
                    field: "quantity.max".to_string(),
                    value: max.to_string(),
                    reason: format!("Must not be below quantity.min ({})", self.quantity.min),
                });
            }
        }

        if let MoneyFormat::GroupedSuffix {
            suffix, decimals, ..
        } = &self.money
        {
            validation::validate_non_empty_string("money.suffix", suffix)?;
            validation::validate_range("money.decimals", *decimals, 0, 2)?;
        }

        validation::validate_non_empty_string("copy.adding", &self.copy.adding)?;
        validation::validate_non_empty_string("copy.added", &self.copy.added)?;
        validation::validate_non_empty_string("copy.add_error", &self.copy.add_error)?;

        validation::validate_non_empty_string(
            "recently_viewed.storage_key",
            &self.recently_viewed.storage_key,
        )?;
        validation::validate_positive_number(
            "recently_viewed.max_items",
            self.recently_viewed.max_items,
            1,
        )?;

        Ok(())
    }

    pub fn base_url(&self) -> &str {
        &self.storefront.base_url
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.storefront.timeout_seconds.unwrap_or(10))
    }

    pub fn success_reset(&self) -> Duration {
        Duration::from_millis(self.timing.success_reset_ms)
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notifications.duration_ms)
    }
}

impl Validate for StorefrontConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
