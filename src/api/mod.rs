//! Remote API access for Steam services.
//!
//! This module provides the [`SteamApi`] transport seam the entities call
//! through, the reqwest-backed [`WebApiClient`] implementation, and the
//! [`Payload`] optional-field accessor used to read Steam's loosely shaped
//! JSON responses.
//!
//! Two HTTP surfaces are covered:
//! - the Web API (`api.steampowered.com`) for schema, stats, and
//!   achievement data, authenticated by query-string key
//! - the storefront API (`store.steampowered.com/api`) for store metadata

pub mod client;
pub mod error;
pub mod payload;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

pub use client::WebApiClient;
pub use error::ApiError;
pub use payload::Payload;
pub use transport::SteamApi;
