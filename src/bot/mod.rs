//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules for better organization:
//! - `actions`: Callback identifiers and slash commands
//! - `storefront`: Browsing and admin behaviour, independent of Telegram
//! - `dialogue_manager`: Admin flow transitions and validation
//! - `ui_builder`: Creates keyboards and formats messages
//! - `reply`: Reply values and their delivery
//! - `message_handler`: Handles incoming text, photo, and document messages
//! - `callback_handler`: Handles inline keyboard callback queries

pub mod actions;
pub mod callback_handler;
pub mod dialogue_manager;
pub mod message_handler;
pub mod reply;
pub mod storefront;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

pub use actions::{Action, Command, ProductField};
pub use dialogue_manager::{advance, Commit, FieldChange, FlowInput, FlowOutcome, Rejection};
pub use reply::{Delivery, Notice, OutgoingMessage, Reply, StateChange};
pub use storefront::Storefront;
