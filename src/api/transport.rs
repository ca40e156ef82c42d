use anyhow::Result;

use super::Payload;

/// Transport seam between entities and the two Steam HTTP surfaces.
///
/// Entities are generic over this trait so the aggregation logic can be
/// exercised against a scripted transport in tests; [`super::WebApiClient`]
/// is the reqwest implementation. Each cache miss issues exactly one call
/// through this seam - retries, batching, and auth live behind it.
#[allow(async_fn_in_trait)]
pub trait SteamApi: Send + Sync {
    /// Generic Web API call:
    /// `https://api.steampowered.com/{interface}/{method}/{version}/`.
    async fn call(
        &self,
        interface: &str,
        method: &str,
        version: &str,
        params: &[(&str, String)],
    ) -> Result<Payload>;

    /// Storefront call: `https://store.steampowered.com/api/{endpoint}`.
    /// Responses are keyed by stringified app id, each entry carrying a
    /// `success` flag and a `data` object.
    async fn store_call(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Payload>;
}
