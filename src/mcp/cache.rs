//! Time-boxed memoized value.

use std::future::Future;

use chrono::{DateTime, Duration, Utc};

/// A value that goes stale `max_age` after it was last refreshed.
#[derive(Debug, Clone)]
pub struct TimedCache<T> {
    value: Option<T>,
    last_refreshed: Option<DateTime<Utc>>,
    max_age: Duration,
}

impl<T> TimedCache<T> {
    /// Create an empty cache.
    pub fn new(max_age: Duration) -> Self {
        Self {
            value: None,
            last_refreshed: None,
            max_age,
        }
    }

    /// Create an empty cache with a max age in seconds.
    pub fn with_max_age_secs(secs: u64) -> Self {
        Self::new(Duration::seconds(secs.min(u64::from(u32::MAX)) as i64))
    }

    /// Replace the value wholesale.
    pub fn store(&mut self, value: T, now: DateTime<Utc>) {
        self.value = Some(value);
        self.last_refreshed = Some(now);
    }

    /// Current value regardless of age.
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Current value if it is still fresh at `now`.
    pub fn get_fresh(&self, now: DateTime<Utc>) -> Option<&T> {
        if self.is_stale(now) {
            None
        } else {
            self.value.as_ref()
        }
    }

    /// True when empty, invalidated, or older than `max_age`.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        match (&self.value, self.last_refreshed) {
            (Some(_), Some(refreshed)) => now - refreshed > self.max_age,
            _ => true,
        }
    }

    /// Force the next [`get_or_refresh`](Self::get_or_refresh) to refresh.
    /// The stale value stays readable through [`get`](Self::get).
    pub fn invalidate(&mut self) {
        self.last_refreshed = None;
    }

    /// Drop the value entirely.
    pub fn clear(&mut self) {
        self.value = None;
        self.last_refreshed = None;
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.last_refreshed
    }

    /// Return a copy of the fresh value, running `refresh` first if it is stale.
    ///
    /// A failed refresh leaves the previous value and timestamp untouched.
    pub async fn get_or_refresh<F, Fut, E>(&mut self, now: DateTime<Utc>, refresh: F) -> Result<T, E>
    where
        T: Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get_fresh(now) {
            return Ok(value.clone());
        }
        let value = refresh().await?;
        self.store(value.clone(), now);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cache_is_stale() {
        let cache: TimedCache<u32> = TimedCache::with_max_age_secs(60);
        assert!(cache.is_stale(Utc::now()));
        assert!(cache.get().is_none());
    }

    #[test]
    fn test_freshness_window() {
        let t0 = Utc::now();
        let mut cache = TimedCache::with_max_age_secs(60);
        cache.store(vec!["a"], t0);

        assert_eq!(cache.get_fresh(t0 + Duration::seconds(59)), Some(&vec!["a"]));
        assert_eq!(cache.get_fresh(t0 + Duration::seconds(60)), Some(&vec!["a"]));
        assert!(cache.get_fresh(t0 + Duration::seconds(61)).is_none());
        assert_eq!(cache.get(), Some(&vec!["a"]));
    }

    #[test]
    fn test_invalidate_keeps_value_readable() {
        let now = Utc::now();
        let mut cache = TimedCache::with_max_age_secs(600);
        cache.store(1, now);
        cache.invalidate();
        assert!(cache.is_stale(now));
        assert_eq!(cache.get(), Some(&1));

        cache.clear();
        assert!(cache.get().is_none());
    }

    #[tokio::test]
    async fn test_get_or_refresh_only_refreshes_when_stale() {
        let t0 = Utc::now();
        let mut cache = TimedCache::with_max_age_secs(10);
        let mut calls = 0;

        let value = cache
            .get_or_refresh(t0, || {
                calls += 1;
                async { Ok::<_, String>(5) }
            })
            .await
            .unwrap();
        assert_eq!(value, 5);

        let value = cache
            .get_or_refresh(t0 + Duration::seconds(5), || {
                calls += 1;
                async { Ok::<_, String>(6) }
            })
            .await
            .unwrap();
        assert_eq!(value, 5);
        assert_eq!(calls, 1);

        let value = cache
            .get_or_refresh(t0 + Duration::seconds(11), || async { Ok::<_, String>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_value() {
        let t0 = Utc::now();
        let mut cache = TimedCache::with_max_age_secs(1);
        cache.store("old", t0);

        let result = cache
            .get_or_refresh(t0 + Duration::seconds(5), || async { Err::<&str, _>("down") })
            .await;
        assert_eq!(result, Err("down"));
        assert_eq!(cache.get(), Some(&"old"));
        assert_eq!(cache.last_refreshed(), Some(t0));
    }
}
