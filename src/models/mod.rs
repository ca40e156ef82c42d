//! Entity models for Steam data.
//!
//! This module contains the lazily cached entity views:
//!
//! - `SteamApp`: an application, aggregating schema, global stats, per-user
//!   stats, and store metadata into one view
//! - `SteamAchievement`: a per-app, per-user achievement record
//! - `EntityId` / `Entity`: the composite identity contract shared by all
//!   entity kinds

pub mod achievement;
pub mod app;
pub mod identity;

pub use achievement::SteamAchievement;
pub use app::SteamApp;
pub use identity::{Entity, EntityId};
