//! Tilda Bridge Core - Shared types library.
//!
//! This crate provides common types used across all Tilda Bridge components:
//! - `server` - Webhook ingestion and Telegram bot service
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows it
//! to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, order statuses, line items, phone
//!   canonicalization, and the order lifecycle transition table

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
