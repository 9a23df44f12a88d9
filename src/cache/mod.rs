//! In-memory TTL cache for upstream forecast payloads
//!
//! This module provides a small key/value store used to avoid hitting the
//! forecast providers repeatedly for the same spot:
//! - Forecast cache: marine forecast by rounded coordinates (15 minutes)
//! - Current-weather cache: current conditions by rounded coordinates (10 minutes)
//!
//! Entries expire lazily. An expired entry is removed the next time it is
//! looked up; nothing sweeps the map in the background, so the map only
//! shrinks on lookup or [`TtlCache::clear`]. Keys are derived from
//! coordinates rounded to two decimals which keeps the key space small.
//!
//! The cache is constructed once at start-up and shared through
//! [`std::sync::Arc`]; there is no global instance.
//!
//! # Example
//!
//! ```rust,ignore
//! use surfe_diem::cache::{CacheNamespace, TtlCache};
//!
//! let cache: TtlCache = TtlCache::new();
//! let key = CacheNamespace::Forecast.key(&Coordinates::new(34.5012, -120.4987));
//! assert_eq!(key, "weather_forecast_34.5_-120.5");
//!
//! cache.set(&key, payload, DEFAULT_FORECAST_TTL).await;
//! let cached = cache.get(&key).await;
//! ```

use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::metrics;
use crate::models::Coordinates;
use crate::utils::round_coordinate;

/// Default TTL for marine forecast payloads (15 minutes)
pub const DEFAULT_FORECAST_TTL: Duration = Duration::from_secs(900);

/// Default TTL for current-conditions payloads (10 minutes)
pub const DEFAULT_CURRENT_TTL: Duration = Duration::from_secs(600);

// ============================================================================
// Keys
// ============================================================================

/// Key namespaces for the different upstream payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheNamespace {
    /// Open-Meteo marine forecast
    Forecast,
    /// weather.gov current observation
    CurrentWeather,
}

impl CacheNamespace {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Forecast => "weather_forecast",
            Self::CurrentWeather => "current_weather",
        }
    }

    /// Cache key for a coordinate pair rounded to two decimals
    pub fn key(&self, coords: &Coordinates) -> String {
        format!(
            "{}_{}_{}",
            self.prefix(),
            round_coordinate(coords.latitude),
            round_coordinate(coords.longitude)
        )
    }
}

// ============================================================================
// Entries
// ============================================================================

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) < self.ttl
    }
}

/// Snapshot of the cache contents for the status endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub cache_size: usize,
    pub cache_keys: Vec<String>,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

/// Cache statistics
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Total cache hits
    pub hits: u64,
    /// Total cache misses (absent or expired)
    pub misses: u64,
}

impl CacheStats {
    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// ============================================================================
// Cache
// ============================================================================

/// Process-local key/value store with per-entry time-to-live
pub struct TtlCache<V = serde_json::Value> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get a value if present and unexpired; expired entries are removed
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();

        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.is_fresh(now) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
            }
        }

        // Expired: re-check under the write lock, a concurrent set may have refreshed it
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key) {
            if entry.is_fresh(Instant::now()) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
            entries.remove(key);
            tracing::debug!(key = %key, "Evicted expired cache entry");
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Insert or overwrite a value
    pub async fn set(&self, key: &str, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            inserted_at: Instant::now(),
            ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
    }

    /// Remove every entry
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let count = entries.len();
        entries.clear();
        tracing::info!(count = count, "Cleared cache");
        count
    }

    /// Number of stored entries, including expired ones not yet looked up
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Size, sorted keys and lookup counters
    pub async fn status(&self) -> CacheStatus {
        let stats = self.stats();
        let entries = self.entries.read().await;
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        CacheStatus {
            cache_size: entries.len(),
            cache_keys: keys,
            hits: stats.hits,
            misses: stats.misses,
            hit_rate: stats.hit_rate(),
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl TtlCache<serde_json::Value> {
    /// Namespaced lookup that also records hit/miss metrics
    pub async fn lookup(&self, namespace: CacheNamespace, key: &str) -> Option<serde_json::Value> {
        let value = self.get(key).await;
        metrics::record_cache_lookup(namespace.prefix(), value.is_some());
        value
    }
}
