//! wapt-inventory: typed client for the WAPT server API.
//!
//! Wraps the three read-only calls the exporter needs:
//!
//! | Call | Path | Auth |
//! |---|---|---|
//! | ping | `/ping` | none |
//! | hosts | `/api/v3/hosts?limit=10000` | basic |
//! | packages | `/api/v3/packages` | basic |
//!
//! Every response is a JSON [`Envelope`]; transport, decode and
//! `success: false` failures all surface as an [`InventoryError`] and are
//! logged by the client before being returned.

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::{InventoryApi, InventoryClient, MAX_HOSTS};
pub use config::InventoryConfig;
pub use error::{InventoryError, InventoryResult};
pub use types::*;
