//! # Checkout Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     KASIR_OUTLET_ID=outlet-01                                          │
//! │     KASIR_LOCK_OPPOSING_DISCOUNT=true                                  │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/kasir-pos/checkout.toml (Linux)                          │
//! │     ~/Library/Application Support/id.kasir.pos/checkout.toml (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     IDR, no decimals, discounts replace each other                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # checkout.toml
//! [store]
//! outlet_id = "outlet-01"
//! name = "Warung Pusat"
//!
//! [currency]
//! code = "IDR"
//! symbol = "Rp"
//! decimals = 0
//!
//! [discount]
//! lock_opposing = false
//! max_percentage_bps = 10000
//!
//! [cart]
//! max_lines = 100
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use kasir_core::{CheckoutRules, Money, MAX_CART_LINES};

use crate::error::{CheckoutError, CheckoutResult};

/// Largest supported minor-unit exponent.
const MAX_CURRENCY_DECIMALS: u8 = 4;

// =============================================================================
// Store
// =============================================================================

/// The outlet this terminal sells for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Outlet identifier sent with every transaction.
    pub outlet_id: String,

    /// Display name.
    #[serde(default)]
    pub name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            outlet_id: "default-outlet".to_string(),
            name: "Kasir Outlet".to_string(),
        }
    }
}

// =============================================================================
// Currency
// =============================================================================

/// Display settings for amounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyConfig {
    /// ISO 4217 code.
    #[serde(default = "default_currency_code")]
    pub code: String,

    #[serde(default = "default_currency_symbol")]
    pub symbol: String,

    /// Minor-unit exponent (IDR: 0, USD: 2).
    #[serde(default)]
    pub decimals: u8,

    #[serde(default = "default_thousands_separator")]
    pub thousands_separator: String,

    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: String,
}

fn default_currency_code() -> String {
    "IDR".to_string()
}

fn default_currency_symbol() -> String {
    "Rp".to_string()
}

fn default_thousands_separator() -> String {
    ".".to_string()
}

fn default_decimal_separator() -> String {
    ",".to_string()
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        CurrencyConfig {
            code: default_currency_code(),
            symbol: default_currency_symbol(),
            decimals: 0,
            thousands_separator: default_thousands_separator(),
            decimal_separator: default_decimal_separator(),
        }
    }
}

// =============================================================================
// Discount
// =============================================================================

/// Discount behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountSettings {
    /// Reject the opposing discount mechanism instead of replacing it.
    #[serde(default)]
    pub lock_opposing: bool,

    /// Highest percentage promotion accepted from the resolver, in basis points.
    #[serde(default = "default_max_percentage_bps")]
    pub max_percentage_bps: u32,
}

fn default_max_percentage_bps() -> u32 {
    10_000
}

impl Default for DiscountSettings {
    fn default() -> Self {
        DiscountSettings {
            lock_opposing: false,
            max_percentage_bps: default_max_percentage_bps(),
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartSettings {
    /// Maximum distinct lines per cart.
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,
}

fn default_max_lines() -> usize {
    MAX_CART_LINES
}

impl Default for CartSettings {
    fn default() -> Self {
        CartSettings {
            max_lines: default_max_lines(),
        }
    }
}

// =============================================================================
// Main Checkout Configuration
// =============================================================================

/// Complete checkout configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub currency: CurrencyConfig,

    #[serde(default)]
    pub discount: DiscountSettings,

    #[serde(default)]
    pub cart: CartSettings,
}

impl CheckoutConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (checkout.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> CheckoutResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading checkout config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load checkout config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses a config file without applying overrides.
    pub fn from_file(path: &Path) -> CheckoutResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> CheckoutResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| CheckoutError::Config("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Checkout config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> CheckoutResult<()> {
        if self.store.outlet_id.trim().is_empty() {
            return Err(CheckoutError::Config("store.outlet_id must not be empty".into()));
        }

        if self.currency.decimals > MAX_CURRENCY_DECIMALS {
            return Err(CheckoutError::Config(format!(
                "currency.decimals must be at most {}, got {}",
                MAX_CURRENCY_DECIMALS, self.currency.decimals
            )));
        }

        if self.discount.max_percentage_bps > 10_000 {
            return Err(CheckoutError::Config(format!(
                "discount.max_percentage_bps must be at most 10000, got {}",
                self.discount.max_percentage_bps
            )));
        }

        if self.cart.max_lines == 0 {
            return Err(CheckoutError::Config(
                "cart.max_lines must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies `KASIR_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from `lookup`, keyed by environment variable name.
    ///
    /// Unparseable values are logged and ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup("KASIR_OUTLET_ID") {
            debug!(outlet_id = %id, "Overriding outlet ID from environment");
            self.store.outlet_id = id;
        }

        if let Some(name) = lookup("KASIR_STORE_NAME") {
            self.store.name = name;
        }

        if let Some(code) = lookup("KASIR_CURRENCY_CODE") {
            self.currency.code = code;
        }

        if let Some(symbol) = lookup("KASIR_CURRENCY_SYMBOL") {
            self.currency.symbol = symbol;
        }

        if let Some(decimals) = lookup("KASIR_CURRENCY_DECIMALS") {
            match decimals.parse::<u8>() {
                Ok(d) => self.currency.decimals = d,
                Err(_) => warn!(value = %decimals, "Ignoring invalid KASIR_CURRENCY_DECIMALS"),
            }
        }

        if let Some(lock) = lookup("KASIR_LOCK_OPPOSING_DISCOUNT") {
            match lock.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.discount.lock_opposing = true,
                "0" | "false" | "no" => self.discount.lock_opposing = false,
                _ => warn!(value = %lock, "Ignoring invalid KASIR_LOCK_OPPOSING_DISCOUNT"),
            }
        }

        if let Some(bps) = lookup("KASIR_MAX_PERCENTAGE_BPS") {
            match bps.parse::<u32>() {
                Ok(b) => self.discount.max_percentage_bps = b,
                Err(_) => warn!(value = %bps, "Ignoring invalid KASIR_MAX_PERCENTAGE_BPS"),
            }
        }

        if let Some(lines) = lookup("KASIR_CART_MAX_LINES") {
            match lines.parse::<usize>() {
                Ok(n) => self.cart.max_lines = n,
                Err(_) => warn!(value = %lines, "Ignoring invalid KASIR_CART_MAX_LINES"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("id", "kasir", "pos")
            .map(|dirs| dirs.config_dir().join("checkout.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn outlet_id(&self) -> &str {
        &self.store.outlet_id
    }

    /// Engine rules derived from this config.
    pub fn rules(&self) -> CheckoutRules {
        CheckoutRules {
            max_lines: self.cart.max_lines,
            lock_opposing_discount: self.discount.lock_opposing,
        }
    }

    /// Formats an amount for display.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = CheckoutConfig::default();
    /// assert_eq!(config.format_currency(Money::from_minor(15000)), "Rp15.000");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        let minor = amount.minor();
        let decimals = u32::from(self.currency.decimals.min(MAX_CURRENCY_DECIMALS));
        let divisor = 10_i64.pow(decimals);
        let whole = (minor / divisor).unsigned_abs();
        let frac = (minor % divisor).unsigned_abs();

        let mut out = String::new();
        if minor < 0 {
            out.push('-');
        }
        out.push_str(&self.currency.symbol);
        out.push_str(&group_thousands(whole, &self.currency.thousands_separator));
        if decimals > 0 {
            out.push_str(&self.currency.decimal_separator);
            out.push_str(&format!("{:0width$}", frac, width = decimals as usize));
        }
        out
    }
}

fn group_thousands(value: u64, separator: &str) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 * separator.len());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push_str(separator);
        }
        grouped.push(ch);
    }
    grouped
}
