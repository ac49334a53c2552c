//! Shared domain types for Pairlore.
//!
//! This crate contains the core domain types used across the Pairlore bot:
//! Chat, Word, Pair, Reply, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod message;
pub mod word;
