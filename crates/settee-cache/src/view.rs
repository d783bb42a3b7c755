use std::time::Duration;

use serde_json::Value;
use settee_store::{DocumentStore, ViewRow};
use settee_types::Collection;
use tracing::debug;

use crate::backend::CacheBackend;
use crate::error::{CacheError, CacheResult};

pub const DEFAULT_VIEW_TTL: Duration = Duration::from_secs(60);

/// Cache key for a view query: `"{uri}-{view}-{params hash}"`.
///
/// Object keys in `params` are serialized in sorted order, so equal
/// parameter sets hash the same regardless of construction order.
pub fn view_cache_key(uri: &str, view: &str, params: &Value) -> String {
    let digest = blake3::hash(params.to_string().as_bytes());
    format!("{uri}-{view}-{}", hex::encode(digest.as_bytes()))
}

/// Query a view through `cache`, storing the rows for `ttl` on a miss.
pub fn cached_view(
    cache: &dyn CacheBackend,
    store: &dyn DocumentStore,
    collection: &Collection,
    view: &str,
    params: &Value,
    ttl: Duration,
) -> CacheResult<Vec<ViewRow>> {
    let key = view_cache_key(&store.uri(collection), view, params);
    if let Some(cached) = cache.get(&key) {
        debug!(%collection, view, "view cache hit");
        return serde_json::from_value(cached).map_err(|e| CacheError::Corrupt {
            key,
            reason: e.to_string(),
        });
    }

    let rows = store.view(collection, view, params)?;
    let encoded =
        serde_json::to_value(&rows).map_err(|e| CacheError::Serialization(e.to_string()))?;
    cache.set(&key, encoded, ttl);
    debug!(%collection, view, rows = rows.len(), "view cache miss");
    Ok(rows)
}
