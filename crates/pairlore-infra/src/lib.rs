//! Infrastructure layer for Pairlore.
//!
//! Contains implementations of the ports defined in `pairlore-core`:
//! the SQLite association store and config-file loading.

pub mod config;
pub mod sqlite;
