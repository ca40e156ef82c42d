//! Lazily cached Steam Web API entities.
//!
//! `steamdex` models remote Steam entities - an app and its achievements -
//! as objects whose fields are fetched on first read and memoized per
//! instance. A property read on a cold cache issues one call through the
//! [`SteamApi`] transport; reads within the TTL window are served locally.
//!
//! ```no_run
//! use std::sync::Arc;
//! use steamdex::{Config, SteamApp, WebApiClient};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let config = Config::resolve()?;
//! let api = Arc::new(WebApiClient::from_config(&config)?);
//! let app = SteamApp::new(api, 440);
//!
//! println!("{}", app.name().await?);
//! for achievement in app.achievements().await? {
//!     println!("  {} ({:.1}%)", achievement.display_name(), achievement.unlock_percentage());
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod models;

pub use api::{ApiError, Payload, SteamApi, WebApiClient};
pub use cache::{CacheEntry, Ttl, TtlCell, INFINITE};
pub use config::Config;
pub use models::{Entity, EntityId, SteamAchievement, SteamApp};
