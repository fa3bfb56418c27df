//! Integration tests for Tilda Bridge.
//!
//! The tests in `tests/` exercise the library crates across their public
//! seams without a live database or chat backend:
//!
//! - `webhook_ingest` - Webhook field parsing and phone canonicalization
//! - `order_lifecycle` - The lifecycle transition table end to end
//! - `telegram_messages` - Order cards and keyboards the bots send
//!
//! Repository and route behavior against a real `PostgreSQL` instance is
//! covered by the migrations plus manual verification; the repositories
//! are thin single-statement wrappers.
