use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::api::{ApiError, Payload, SteamApi};
use crate::cache::{TtlCell, INFINITE};

use super::{Entity, EntityId, SteamAchievement};

/// Store fields requested from `appdetails`. One cached fetch with this
/// filter list feeds every derived store accessor.
const STORE_FILTERS: &str = "basic,fullgame,developers,publishers,demos,price_overview,\
                             platforms,metacritic,categories,genres,recommendations,release_date";

/// A Steam application, its fields lazily fetched and cached per instance.
///
/// A property read triggers at most one fetch; subsequent reads within the
/// TTL window (infinite for everything here) are served from the instance's
/// cache. Two instances built for the same id fetch independently - there is
/// no shared cache.
///
/// An optional user id can be bound at construction; it scopes the per-user
/// parts of [`Self::achievements`] and is handed down to every constructed
/// [`SteamAchievement`].
pub struct SteamApp<C> {
    api: Arc<C>,
    id: u32,
    user_id: Option<u64>,
    schema: TtlCell<Payload>,
    name: TtlCell<String>,
    achievements: TtlCell<Vec<SteamAchievement<C>>>,
    app_info: TtlCell<Option<Payload>>,
}

impl<C: SteamApi> SteamApp<C> {
    pub fn new(api: Arc<C>, appid: u32) -> Self {
        Self::build(api, appid, None, None)
    }

    /// An app view scoped to a user; per-user unlock data becomes available
    /// to the achievement aggregation.
    pub fn with_user(api: Arc<C>, appid: u32, user_id: u64) -> Self {
        Self::build(api, appid, Some(user_id), None)
    }

    /// Build from a raw API fragment (e.g. one entry of an owned-games
    /// response). The fragment must carry an `appid`; a `name`, when
    /// present, preloads the name cache so reading it costs no fetch.
    pub fn from_fragment(api: Arc<C>, fragment: &Payload, user_id: Option<u64>) -> Result<Self> {
        let appid = fragment
            .u64_at("appid")
            .ok_or_else(|| ApiError::InvalidFragment("missing appid field".to_string()))?
            as u32;
        let name = fragment.str_at("name").map(str::to_string);
        Ok(Self::build(api, appid, user_id, name))
    }

    fn build(api: Arc<C>, appid: u32, user_id: Option<u64>, name: Option<String>) -> Self {
        Self {
            api,
            id: appid,
            user_id,
            schema: TtlCell::new(INFINITE),
            name: match name {
                Some(name) => TtlCell::preloaded(INFINITE, name),
                None => TtlCell::new(INFINITE),
            },
            achievements: TtlCell::new(INFINITE),
            app_info: TtlCell::new(INFINITE),
        }
    }

    pub fn appid(&self) -> u32 {
        self.id
    }

    pub fn user_id(&self) -> Option<u64> {
        self.user_id
    }

    /// Raw `GetSchemaForGame` metadata for this app, fetched once and shared
    /// by [`Self::name`] and [`Self::achievements`].
    pub async fn schema(&self) -> Result<Payload> {
        self.schema
            .get_or_try_fill(|| async move {
                self.api
                    .call(
                        "ISteamUserStats",
                        "GetSchemaForGame",
                        "v2",
                        &[("appid", self.id.to_string())],
                    )
                    .await
            })
            .await
    }

    /// The app's display name, from the schema.
    pub async fn name(&self) -> Result<String> {
        self.name
            .get_or_try_fill(|| async move {
                let schema = self.schema().await?;
                let name = schema.str_at("game.gameName").ok_or_else(|| {
                    ApiError::InvalidResponse("schema carries no game.gameName".to_string())
                })?;
                Ok(name.to_string())
            })
            .await
    }

    /// The app's achievements in schema order, assembled once from up to
    /// three calls: global unlock percentages, per-user stats (only when a
    /// user is bound), and the cached schema.
    ///
    /// Apps whose schema has no `availableGameStats` section expose no
    /// achievement metadata (commonly hidden or unsupported apps); they
    /// yield an empty list, not an error.
    pub async fn achievements(&self) -> Result<Vec<SteamAchievement<C>>> {
        self.achievements
            .get_or_try_fill(|| self.assemble_achievements())
            .await
    }

    async fn assemble_achievements(&self) -> Result<Vec<SteamAchievement<C>>> {
        let global = self
            .api
            .call(
                "ISteamUserStats",
                "GetGlobalAchievementPercentagesForApp",
                "v2",
                &[("gameid", self.id.to_string())],
            )
            .await?;
        let mut percentages: HashMap<String, f64> = HashMap::new();
        for entry in global.array_at("achievementpercentages.achievements") {
            if let (Some(name), Some(percent)) = (entry.str_at("name"), entry.f64_at("percent")) {
                percentages.insert(name.to_string(), percent);
            }
        }

        // Per-user unlock data only exists when a user is bound.
        let achieved_names: Option<HashSet<String>> = match self.user_id {
            Some(user_id) => Some(self.fetch_achieved_names(user_id).await?),
            None => None,
        };

        let schema = self.schema().await?;
        if !schema.has("game.availableGameStats") {
            debug!(appid = self.id, "schema has no availableGameStats section");
            return Ok(Vec::new());
        }

        let mut achievements = Vec::new();
        for definition in schema.array_at("game.availableGameStats.achievements") {
            let api_name = match definition.str_at("name") {
                Some(name) => name.to_string(),
                None => continue,
            };
            let display_name = definition
                .str_at("displayName")
                .unwrap_or(api_name.as_str())
                .to_string();
            // Join global percentages by api name; unmatched defaults to 0.0
            // and orphan global entries are simply never looked up.
            let percent = percentages.get(&api_name).copied().unwrap_or(0.0);
            let hidden = definition.u64_at("hidden").unwrap_or(0) != 0;

            let achievement = SteamAchievement::new(
                Arc::clone(&self.api),
                self.id,
                api_name.clone(),
                display_name,
                self.user_id,
                percent,
            );
            achievement.prime_hidden(hidden).await;
            if let Some(ref achieved) = achieved_names {
                achievement.prime_achieved(achieved.contains(&api_name)).await;
            }
            achievements.push(achievement);
        }

        debug!(
            appid = self.id,
            count = achievements.len(),
            "assembled achievement list"
        );
        Ok(achievements)
    }

    async fn fetch_achieved_names(&self, user_id: u64) -> Result<HashSet<String>> {
        let stats = self
            .api
            .call(
                "ISteamUserStats",
                "GetPlayerAchievements",
                "v1",
                &[
                    ("steamid", user_id.to_string()),
                    ("appid", self.id.to_string()),
                    ("l", "english".to_string()),
                ],
            )
            .await?;

        // An absent achievements key means nothing unlocked yet, not an error.
        let names = stats
            .array_at("playerstats.achievements")
            .into_iter()
            .filter(|entry| entry.u64_at("achieved").unwrap_or(0) != 0)
            .filter_map(|entry| entry.str_at("apiname").map(str::to_string))
            .collect();
        Ok(names)
    }

    /// Aggregated store metadata for this app, fetched once.
    ///
    /// A `success: false` store response means the storefront has nothing
    /// for this id; that is modeled as `None`, not an error, and every
    /// derived accessor below tolerates it.
    pub async fn app_info(&self) -> Result<Option<Payload>> {
        self.app_info
            .get_or_try_fill(|| async move {
                let response = self
                    .api
                    .store_call(
                        "appdetails",
                        &[
                            ("appids", self.id.to_string()),
                            ("filters", STORE_FILTERS.to_string()),
                        ],
                    )
                    .await?;

                let key = self.id.to_string();
                if !response.bool_at(&format!("{}.success", key)).unwrap_or(false) {
                    debug!(appid = self.id, "store has no data for this app");
                    return Ok(None);
                }
                Ok(response.child(&format!("{}.data", key)))
            })
            .await
    }

    // ===== Store-derived accessors =====
    // Pure projections of the single cached `app_info` fetch; an absent base
    // value projects to an absent result.

    async fn store_string(&self, field: &str) -> Result<Option<String>> {
        Ok(self
            .app_info()
            .await?
            .and_then(|info| info.str_at(field).map(str::to_string)))
    }

    async fn store_number(&self, field: &str) -> Result<Option<u64>> {
        Ok(self.app_info().await?.and_then(|info| info.u64_at(field)))
    }

    async fn store_object(&self, field: &str) -> Result<Option<Payload>> {
        Ok(self.app_info().await?.and_then(|info| info.child(field)))
    }

    async fn store_list(&self, field: &str) -> Result<Option<Vec<Payload>>> {
        Ok(self.app_info().await?.and_then(|info| info.array_opt(field)))
    }

    /// Store classification: "game", "dlc", "demo", ...
    pub async fn app_type(&self) -> Result<Option<String>> {
        self.store_string("type").await
    }

    pub async fn required_age(&self) -> Result<Option<u64>> {
        self.store_number("required_age").await
    }

    /// Appids of this app's downloadable content.
    pub async fn dlc(&self) -> Result<Option<Vec<Payload>>> {
        self.store_list("dlc").await
    }

    pub async fn detailed_description(&self) -> Result<Option<String>> {
        self.store_string("detailed_description").await
    }

    pub async fn about_the_game(&self) -> Result<Option<String>> {
        self.store_string("about_the_game").await
    }

    pub async fn supported_languages(&self) -> Result<Option<String>> {
        self.store_string("supported_languages").await
    }

    pub async fn header_image(&self) -> Result<Option<String>> {
        self.store_string("header_image").await
    }

    pub async fn website(&self) -> Result<Option<String>> {
        self.store_string("website").await
    }

    pub async fn pc_requirements(&self) -> Result<Option<Payload>> {
        self.store_object("pc_requirements").await
    }

    pub async fn mac_requirements(&self) -> Result<Option<Payload>> {
        self.store_object("mac_requirements").await
    }

    pub async fn linux_requirements(&self) -> Result<Option<Payload>> {
        self.store_object("linux_requirements").await
    }

    /// For DLC entries: the base game this content belongs to.
    pub async fn fullgame(&self) -> Result<Option<Payload>> {
        self.store_object("fullgame").await
    }

    pub async fn developers(&self) -> Result<Option<Vec<String>>> {
        Ok(self.store_list("developers").await?.map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.as_str().map(str::to_string))
                .collect()
        }))
    }

    pub async fn publishers(&self) -> Result<Option<Vec<String>>> {
        Ok(self.store_list("publishers").await?.map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.as_str().map(str::to_string))
                .collect()
        }))
    }

    pub async fn demos(&self) -> Result<Option<Vec<Payload>>> {
        self.store_list("demos").await
    }

    pub async fn price_overview(&self) -> Result<Option<Payload>> {
        self.store_object("price_overview").await
    }

    pub async fn platforms(&self) -> Result<Option<Payload>> {
        self.store_object("platforms").await
    }

    pub async fn metacritic(&self) -> Result<Option<Payload>> {
        self.store_object("metacritic").await
    }

    pub async fn categories(&self) -> Result<Option<Vec<Payload>>> {
        self.store_list("categories").await
    }

    pub async fn genres(&self) -> Result<Option<Vec<Payload>>> {
        self.store_list("genres").await
    }

    pub async fn recommendations(&self) -> Result<Option<Payload>> {
        self.store_object("recommendations").await
    }

    pub async fn release_date(&self) -> Result<Option<Payload>> {
        self.store_object("release_date").await
    }
}

impl<C> Entity for SteamApp<C> {
    fn identity(&self) -> EntityId {
        EntityId::App(self.id)
    }
}

impl<C> PartialEq for SteamApp<C> {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl<C> Eq for SteamApp<C> {}

impl<C> Hash for SteamApp<C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl<C> fmt::Debug for SteamApp<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SteamApp")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::api::mock::{init_tracing, MockApi};

    use super::*;

    const APPID: u32 = 70;
    const USER: u64 = 76561198000000001;

    fn stub_schema_two_achievements(api: &MockApi) {
        api.stub(
            "ISteamUserStats",
            "GetSchemaForGame",
            json!({"game": {
                "gameName": "Half-Life",
                "availableGameStats": {"achievements": [
                    {"name": "A", "displayName": "First", "hidden": 0},
                    {"name": "B", "displayName": "Second", "hidden": 1},
                ]}
            }}),
        );
    }

    fn stub_global_percentages(api: &MockApi) {
        api.stub(
            "ISteamUserStats",
            "GetGlobalAchievementPercentagesForApp",
            json!({"achievementpercentages": {"achievements": [
                {"name": "A", "percent": 10.0},
                {"name": "B", "percent": 20.0},
                {"name": "ORPHAN", "percent": 99.0},
            ]}}),
        );
    }

    #[tokio::test]
    async fn test_merges_schema_globals_and_user_unlocks() {
        init_tracing();
        let api = Arc::new(MockApi::new());
        stub_schema_two_achievements(&api);
        stub_global_percentages(&api);
        api.stub(
            "ISteamUserStats",
            "GetPlayerAchievements",
            json!({"playerstats": {"achievements": [
                {"apiname": "A", "achieved": 1},
                {"apiname": "B", "achieved": 0},
            ]}}),
        );

        let app = SteamApp::with_user(Arc::clone(&api), APPID, USER);
        let achievements = app.achievements().await.unwrap();

        assert_eq!(achievements.len(), 2);
        // Schema order is preserved.
        assert_eq!(achievements[0].api_name(), "A");
        assert_eq!(achievements[0].display_name(), "First");
        assert_eq!(achievements[0].unlock_percentage(), 10.0);
        assert_eq!(achievements[0].is_achieved().await, Some(true));
        assert!(!achievements[0].is_hidden().await.unwrap());

        assert_eq!(achievements[1].api_name(), "B");
        assert_eq!(achievements[1].unlock_percentage(), 20.0);
        assert_eq!(achievements[1].is_achieved().await, Some(false));
        assert!(achievements[1].is_hidden().await.unwrap());

        // Primed flags were answered from cache: one call per endpoint.
        assert_eq!(api.calls_to("ISteamUserStats/GetSchemaForGame"), 1);
        assert_eq!(
            api.calls_to("ISteamUserStats/GetGlobalAchievementPercentagesForApp"),
            1
        );
        assert_eq!(api.calls_to("ISteamUserStats/GetPlayerAchievements"), 1);
    }

    #[tokio::test]
    async fn test_achievement_list_is_cached() {
        let api = Arc::new(MockApi::new());
        stub_schema_two_achievements(&api);
        stub_global_percentages(&api);

        let app = SteamApp::new(Arc::clone(&api), APPID);
        let first = app.achievements().await.unwrap();
        let second = app.achievements().await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
        assert_eq!(
            api.calls_to("ISteamUserStats/GetGlobalAchievementPercentagesForApp"),
            1
        );
        assert_eq!(api.calls_to("ISteamUserStats/GetSchemaForGame"), 1);
    }

    #[tokio::test]
    async fn test_unmatched_global_percentage_defaults_to_zero() {
        let api = Arc::new(MockApi::new());
        stub_schema_two_achievements(&api);
        api.stub(
            "ISteamUserStats",
            "GetGlobalAchievementPercentagesForApp",
            json!({"achievementpercentages": {"achievements": [
                {"name": "A", "percent": 10.0},
            ]}}),
        );

        let app = SteamApp::new(api, APPID);
        let achievements = app.achievements().await.unwrap();
        assert_eq!(achievements[1].unlock_percentage(), 0.0);
    }

    #[tokio::test]
    async fn test_hidden_app_yields_empty_list() {
        init_tracing();
        let api = Arc::new(MockApi::new());
        // Hidden/unsupported apps return a schema without availableGameStats.
        api.stub("ISteamUserStats", "GetSchemaForGame", json!({"game": {}}));
        stub_global_percentages(&api);

        let app = SteamApp::new(api, APPID);
        let achievements = app.achievements().await.unwrap();
        assert!(achievements.is_empty());
    }

    #[tokio::test]
    async fn test_unbound_user_skips_player_stats_and_leaves_achieved_unset() {
        let api = Arc::new(MockApi::new());
        stub_schema_two_achievements(&api);
        stub_global_percentages(&api);

        let app = SteamApp::new(Arc::clone(&api), APPID);
        let achievements = app.achievements().await.unwrap();

        assert_eq!(api.calls_to("ISteamUserStats/GetPlayerAchievements"), 0);
        assert_eq!(achievements[0].is_achieved().await, None);

        // The lazy per-user recheck stays user-scoped and refuses to run.
        let err = achievements[0].is_unlocked().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::NoLinkedUser)
        ));
    }

    #[tokio::test]
    async fn test_user_with_no_unlocks_is_an_empty_set() {
        let api = Arc::new(MockApi::new());
        stub_schema_two_achievements(&api);
        stub_global_percentages(&api);
        // Zero achievements unlocked: the achievements key is simply absent.
        api.stub(
            "ISteamUserStats",
            "GetPlayerAchievements",
            json!({"playerstats": {"error": "Requested app has no stats"}}),
        );

        let app = SteamApp::with_user(api, APPID, USER);
        let achievements = app.achievements().await.unwrap();
        assert_eq!(achievements[0].is_achieved().await, Some(false));
        assert_eq!(achievements[1].is_achieved().await, Some(false));
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let api = Arc::new(MockApi::new());
        stub_schema_two_achievements(&api);
        // Globals missing: the unconditional first call fails.

        let app = SteamApp::new(Arc::clone(&api), APPID);
        assert!(app.achievements().await.is_err());

        stub_global_percentages(&api);
        let achievements = app.achievements().await.unwrap();
        assert_eq!(achievements.len(), 2);
        assert_eq!(
            api.calls_to("ISteamUserStats/GetGlobalAchievementPercentagesForApp"),
            2
        );
    }

    #[tokio::test]
    async fn test_name_comes_from_schema_and_is_cached() {
        let api = Arc::new(MockApi::new());
        stub_schema_two_achievements(&api);

        let app = SteamApp::new(Arc::clone(&api), APPID);
        assert_eq!(app.name().await.unwrap(), "Half-Life");
        assert_eq!(app.name().await.unwrap(), "Half-Life");
        assert_eq!(api.calls_to("ISteamUserStats/GetSchemaForGame"), 1);
    }

    #[tokio::test]
    async fn test_fragment_construction_requires_appid() {
        let api = Arc::new(MockApi::new());
        let err = SteamApp::from_fragment(Arc::clone(&api), &Payload::new(json!({"name": "X"})), None)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::InvalidFragment(_))
        ));

        let app = SteamApp::from_fragment(
            Arc::clone(&api),
            &Payload::new(json!({"appid": 70, "name": "Half-Life"})),
            Some(USER),
        )
        .unwrap();
        assert_eq!(app.appid(), APPID);
        assert_eq!(app.user_id(), Some(USER));
        // Preloaded name: no schema fetch needed.
        assert_eq!(app.name().await.unwrap(), "Half-Life");
        assert_eq!(api.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_store_info_success_feeds_derived_accessors() {
        let api = Arc::new(MockApi::new());
        api.stub_store(
            "appdetails",
            json!({"70": {"success": true, "data": {
                "type": "game",
                "required_age": "18",
                "developers": ["Valve"],
                "publishers": ["Valve"],
                "platforms": {"windows": true, "mac": true, "linux": true},
                "price_overview": {"currency": "USD", "final": 999},
                "release_date": {"coming_soon": false, "date": "Nov 8, 1998"},
                "categories": [{"id": 2, "description": "Single-player"}],
            }}}),
        );

        let app = SteamApp::new(Arc::clone(&api), APPID);
        assert_eq!(app.app_type().await.unwrap().as_deref(), Some("game"));
        assert_eq!(app.required_age().await.unwrap(), Some(18));
        assert_eq!(
            app.developers().await.unwrap(),
            Some(vec!["Valve".to_string()])
        );
        let platforms = app.platforms().await.unwrap().expect("platforms object");
        assert_eq!(platforms.bool_at("linux"), Some(true));
        let release = app.release_date().await.unwrap().expect("release date");
        assert_eq!(release.str_at("date"), Some("Nov 8, 1998"));
        assert_eq!(app.categories().await.unwrap().map(|c| c.len()), Some(1));

        // Every accessor above projected the one cached fetch.
        assert_eq!(api.calls_to("store/appdetails"), 1);
    }

    #[tokio::test]
    async fn test_store_failure_projects_to_absent_everywhere() {
        init_tracing();
        let api = Arc::new(MockApi::new());
        api.stub_store("appdetails", json!({"70": {"success": false}}));

        let app = SteamApp::new(Arc::clone(&api), APPID);
        assert!(app.app_info().await.unwrap().is_none());
        assert!(app.app_type().await.unwrap().is_none());
        assert!(app.required_age().await.unwrap().is_none());
        assert!(app.dlc().await.unwrap().is_none());
        assert!(app.detailed_description().await.unwrap().is_none());
        assert!(app.developers().await.unwrap().is_none());
        assert!(app.publishers().await.unwrap().is_none());
        assert!(app.platforms().await.unwrap().is_none());
        assert!(app.price_overview().await.unwrap().is_none());
        assert!(app.metacritic().await.unwrap().is_none());
        assert!(app.genres().await.unwrap().is_none());
        assert!(app.release_date().await.unwrap().is_none());

        // The "no data" answer itself is cached.
        assert_eq!(api.calls_to("store/appdetails"), 1);
    }

    #[tokio::test]
    async fn test_apps_with_same_id_are_equal_across_users() {
        let api = Arc::new(MockApi::new());
        let plain = SteamApp::new(Arc::clone(&api), APPID);
        let scoped = SteamApp::with_user(Arc::clone(&api), APPID, USER);
        let other = SteamApp::new(api, 440);

        assert_eq!(plain, scoped);
        assert_ne!(plain, other);
    }
}
