//! # Configuration Module
//!
//! Bot settings read from the environment (a `.env` file is honoured by
//! `main`). Everything except the bot token has a default.

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

// Defaults for optional settings
pub const DEFAULT_ADMIN_ID: u64 = 123456789;
pub const DEFAULT_SELLER_CONTACT: &str = "@seller_username";
pub const DEFAULT_CATEGORIES_FILE: &str = "data/categories.json";
pub const DEFAULT_PRODUCTS_FILE: &str = "data/products.json";
pub const DEFAULT_IMAGES_DIR: &str = crate::image_store::DEFAULT_IMAGES_DIR;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Where the catalog lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// Two JSON documents on disk
    Json {
        categories_file: PathBuf,
        products_file: PathBuf,
    },
    /// PostgreSQL database
    Postgres { database_url: String },
}

/// Storefront settings shared by the handlers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopSettings {
    /// The single Telegram user allowed to manage the catalog
    pub admin_id: u64,
    /// Contact handed to customers who want to order
    pub seller_contact: String,
    /// Community link shown on the welcome screen, if any
    pub group: Option<String>,
}

impl Default for ShopSettings {
    fn default() -> Self {
        Self {
            admin_id: DEFAULT_ADMIN_ID,
            seller_contact: DEFAULT_SELLER_CONTACT.to_string(),
            group: None,
        }
    }
}

/// Complete bot configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub bot_token: String,
    pub shop: ShopSettings,
    pub storage: StorageConfig,
    pub images_dir: PathBuf,
    pub log_format: LogFormat,
}

impl BotConfig {
    /// Reads the configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let bot_token = get("BOT_TOKEN").ok_or_else(|| anyhow!("BOT_TOKEN must be set"))?;

        let admin_id = match get("ADMIN_ID") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("ADMIN_ID must be a Telegram user id, got '{raw}'"))?,
            None => DEFAULT_ADMIN_ID,
        };

        let seller_contact =
            get("SELLER_CONTACT").unwrap_or_else(|| DEFAULT_SELLER_CONTACT.to_string());

        // "null" was the historical placeholder for "no community link"
        let group = get("GROUP").filter(|value| value.trim() != "null");

        let storage = match get("DATABASE_URL") {
            Some(database_url) => StorageConfig::Postgres { database_url },
            None => StorageConfig::Json {
                categories_file: get("CATEGORIES_FILE")
                    .unwrap_or_else(|| DEFAULT_CATEGORIES_FILE.to_string())
                    .into(),
                products_file: get("PRODUCTS_FILE")
                    .unwrap_or_else(|| DEFAULT_PRODUCTS_FILE.to_string())
                    .into(),
            },
        };

        let images_dir = get("IMAGES_DIR")
            .unwrap_or_else(|| DEFAULT_IMAGES_DIR.to_string())
            .into();

        let log_format = match get("LOG_FORMAT").as_deref().map(str::trim) {
            Some(format) if format.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            bot_token,
            shop: ShopSettings {
                admin_id,
                seller_contact,
                group,
            },
            storage,
            images_dir,
            log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BotConfig::from_lookup(lookup_from(&[("BOT_TOKEN", "123:abc")])).unwrap();

        assert_eq!(config.bot_token, "123:abc");
        assert_eq!(config.shop, ShopSettings::default());
        assert_eq!(
            config.storage,
            StorageConfig::Json {
                categories_file: DEFAULT_CATEGORIES_FILE.into(),
                products_file: DEFAULT_PRODUCTS_FILE.into(),
            }
        );
        assert_eq!(config.images_dir, PathBuf::from(DEFAULT_IMAGES_DIR));
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_missing_token() {
        assert!(BotConfig::from_lookup(lookup_from(&[])).is_err());
        assert!(BotConfig::from_lookup(lookup_from(&[("BOT_TOKEN", "  ")])).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = BotConfig::from_lookup(lookup_from(&[
            ("BOT_TOKEN", "t"),
            ("ADMIN_ID", "42"),
            ("SELLER_CONTACT", "@vape_shop"),
            ("GROUP", "https://t.me/vape_group"),
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("IMAGES_DIR", "/var/lib/shop/images"),
            ("LOG_FORMAT", "JSON"),
        ]))
        .unwrap();

        assert_eq!(config.shop.admin_id, 42);
        assert_eq!(config.shop.seller_contact, "@vape_shop");
        assert_eq!(config.shop.group.as_deref(), Some("https://t.me/vape_group"));
        assert_eq!(
            config.storage,
            StorageConfig::Postgres {
                database_url: "postgres://localhost/shop".to_string()
            }
        );
        assert_eq!(config.images_dir, PathBuf::from("/var/lib/shop/images"));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_null_group_means_no_link() {
        let config =
            BotConfig::from_lookup(lookup_from(&[("BOT_TOKEN", "t"), ("GROUP", "null")])).unwrap();
        assert_eq!(config.shop.group, None);
    }

    #[test]
    fn test_invalid_admin_id() {
        let result = BotConfig::from_lookup(lookup_from(&[("BOT_TOKEN", "t"), ("ADMIN_ID", "admin")]));
        assert!(result.is_err());
    }
}
