//! # Storefront Telegram Bot
//!
//! A Telegram shop bot: customers browse categories and products and get the
//! seller's contact to order, while a single admin manages the catalog
//! through multi-step conversations.

pub mod bot;
pub mod catalog;
pub mod config;
pub mod dialogue;
pub mod image_store;
pub mod localization;
