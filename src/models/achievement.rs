use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use anyhow::Result;

use crate::api::{ApiError, SteamApi};
use crate::cache::{TtlCell, INFINITE};

use super::{Entity, EntityId};

/// A single achievement of a Steam app, optionally scoped to a user.
///
/// Instances are only constructed by [`super::SteamApp`]'s aggregation step,
/// which also primes `is_hidden` (and `is_achieved`, when a user is bound)
/// so that reading them costs no extra fetch. An achievement does not hold a
/// back-reference to its owning app, only the `appid`.
///
/// Clones share cache cells: a flag primed on the aggregator's copy is
/// visible through every clone.
pub struct SteamAchievement<C> {
    api: Arc<C>,
    appid: u32,
    api_name: String,
    display_name: String,
    user_id: Option<u64>,
    unlock_percentage: f64,
    hidden: Arc<TtlCell<bool>>,
    achieved: Arc<TtlCell<bool>>,
    unlocked: Arc<TtlCell<bool>>,
}

impl<C> Clone for SteamAchievement<C> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            appid: self.appid,
            api_name: self.api_name.clone(),
            display_name: self.display_name.clone(),
            user_id: self.user_id,
            unlock_percentage: self.unlock_percentage,
            hidden: Arc::clone(&self.hidden),
            achieved: Arc::clone(&self.achieved),
            unlocked: Arc::clone(&self.unlocked),
        }
    }
}

impl<C: SteamApi> SteamAchievement<C> {
    pub(crate) fn new(
        api: Arc<C>,
        appid: u32,
        api_name: String,
        display_name: String,
        user_id: Option<u64>,
        unlock_percentage: f64,
    ) -> Self {
        Self {
            api,
            appid,
            api_name,
            display_name,
            user_id,
            unlock_percentage,
            hidden: Arc::new(TtlCell::new(INFINITE)),
            achieved: Arc::new(TtlCell::new(INFINITE)),
            unlocked: Arc::new(TtlCell::new(INFINITE)),
        }
    }

    pub fn appid(&self) -> u32 {
        self.appid
    }

    /// Remote identifier (`apiname` in the Web API).
    pub fn api_name(&self) -> &str {
        &self.api_name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn user_id(&self) -> Option<u64> {
        self.user_id
    }

    /// Global unlock percentage, joined in by the owning app's aggregation.
    /// 0.0 when the global stats had no entry for this achievement.
    pub fn unlock_percentage(&self) -> f64 {
        self.unlock_percentage
    }

    pub(crate) async fn prime_hidden(&self, hidden: bool) {
        self.hidden.store(hidden).await;
    }

    pub(crate) async fn prime_achieved(&self, achieved: bool) {
        self.achieved.store(achieved).await;
    }

    /// Whether the schema marks this achievement as hidden.
    ///
    /// The value primed by the owning app's aggregation wins; without one,
    /// the schema is re-fetched and searched for this achievement's api
    /// name. An api name absent from the schema reads as not hidden.
    pub async fn is_hidden(&self) -> Result<bool> {
        self.hidden
            .get_or_try_fill(|| async move {
                let schema = self
                    .api
                    .call(
                        "ISteamUserStats",
                        "GetSchemaForGame",
                        "v2",
                        &[("appid", self.appid.to_string())],
                    )
                    .await?;
                let hidden = schema
                    .array_at("game.availableGameStats.achievements")
                    .iter()
                    .find(|def| def.str_at("name") == Some(self.api_name.as_str()))
                    .map(|def| def.u64_at("hidden").unwrap_or(0) != 0)
                    .unwrap_or(false);
                Ok(hidden)
            })
            .await
    }

    /// Batch unlock state assigned by the owning app's aggregation, if any.
    ///
    /// Never fetches - `None` means the aggregation ran without a bound user
    /// (or this instance was never aggregated). [`Self::is_unlocked`] is the
    /// live per-achievement recheck; the two are separate cache entries and
    /// may disagree when read at different times.
    pub async fn is_achieved(&self) -> Option<bool> {
        self.achieved.peek().await
    }

    /// Live per-user unlock state, fetched once and scoped to this
    /// achievement's api name. Unlock state is inherently user-scoped, so
    /// this fails when no user id is bound.
    pub async fn is_unlocked(&self) -> Result<bool> {
        let user_id = self.user_id.ok_or(ApiError::NoLinkedUser)?;
        self.unlocked
            .get_or_try_fill(|| async move {
                let stats = self
                    .api
                    .call(
                        "ISteamUserStats",
                        "GetPlayerAchievements",
                        "v1",
                        &[
                            ("steamid", user_id.to_string()),
                            ("appid", self.appid.to_string()),
                            ("l", "english".to_string()),
                        ],
                    )
                    .await?;
                // An api name missing from the player's list reads as locked.
                let unlocked = stats
                    .array_at("playerstats.achievements")
                    .iter()
                    .find(|entry| entry.str_at("apiname") == Some(self.api_name.as_str()))
                    .map(|entry| entry.u64_at("achieved").unwrap_or(0) == 1)
                    .unwrap_or(false);
                Ok(unlocked)
            })
            .await
    }
}

impl<C> Entity for SteamAchievement<C> {
    fn identity(&self) -> EntityId {
        EntityId::Achievement {
            appid: self.appid,
            api_name: self.api_name.clone(),
        }
    }
}

impl<C> PartialEq for SteamAchievement<C> {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl<C> Eq for SteamAchievement<C> {}

impl<C> Hash for SteamAchievement<C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl<C> fmt::Debug for SteamAchievement<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SteamAchievement")
            .field("appid", &self.appid)
            .field("api_name", &self.api_name)
            .field("display_name", &self.display_name)
            .field("user_id", &self.user_id)
            .field("unlock_percentage", &self.unlock_percentage)
            .finish()
    }
}
