//! Memoizing decorator over any [`MarketDataProvider`].
//!
//! Used by the interactive session so that re-rendering the same report does
//! not hit the network again. Nothing in the matrix or highlight code depends
//! on it; failed fetches are never stored.

use crate::error::ProviderError;
use crate::models::{CompanyProfile, PricePoint, RawIndicators, Ticker};
use crate::provider::MarketDataProvider;
use async_trait::async_trait;
use cached::{Cached, TimedCache};
use chrono::NaiveDate;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Operation {
    Indicators,
    Profile,
    History { start: NaiveDate, end: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    ticker: Ticker,
    operation: Operation,
}

#[derive(Debug, Clone)]
enum CachedValue {
    Indicators(RawIndicators),
    Profile(CompanyProfile),
    History(Vec<PricePoint>),
}

pub struct CachedProvider<P> {
    inner: P,
    cache: RwLock<TimedCache<CacheKey, CachedValue>>,
}

impl<P: MarketDataProvider> CachedProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            cache: RwLock::new(TimedCache::with_lifespan(ttl)),
        }
    }

    #[cfg(test)]
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Drop every memoized response.
    pub async fn invalidate_all(&self) {
        let mut cache = self.cache.write().await;
        cache.cache_clear();
        debug!("Provider cache cleared");
    }

    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    async fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        // cache_get needs &mut to evict expired entries
        let mut cache = self.cache.write().await;
        cache.cache_get(key).cloned()
    }

    async fn insert(&self, key: CacheKey, value: CachedValue) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key, value);
    }
}

#[async_trait]
impl<P: MarketDataProvider> MarketDataProvider for CachedProvider<P> {
    async fn fetch_indicators(&self, ticker: &Ticker) -> Result<RawIndicators, ProviderError> {
        let key = CacheKey {
            ticker: ticker.clone(),
            operation: Operation::Indicators,
        };
        if let Some(CachedValue::Indicators(raw)) = self.get(&key).await {
            debug!("Cache hit: indicators for {}", ticker);
            return Ok(raw);
        }

        let raw = self.inner.fetch_indicators(ticker).await?;
        self.insert(key, CachedValue::Indicators(raw.clone())).await;
        Ok(raw)
    }

    async fn fetch_profile(&self, ticker: &Ticker) -> Result<CompanyProfile, ProviderError> {
        let key = CacheKey {
            ticker: ticker.clone(),
            operation: Operation::Profile,
        };
        if let Some(CachedValue::Profile(profile)) = self.get(&key).await {
            debug!("Cache hit: profile for {}", ticker);
            return Ok(profile);
        }

        let profile = self.inner.fetch_profile(ticker).await?;
        self.insert(key, CachedValue::Profile(profile.clone())).await;
        Ok(profile)
    }

    async fn fetch_history(
        &self,
        ticker: &Ticker,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, ProviderError> {
        let key = CacheKey {
            ticker: ticker.clone(),
            operation: Operation::History { start, end },
        };
        if let Some(CachedValue::History(points)) = self.get(&key).await {
            debug!("Cache hit: history for {} {}..{}", ticker, start, end);
            return Ok(points);
        }

        let points = self.inner.fetch_history(ticker, start, end).await?;
        self.insert(key, CachedValue::History(points.clone())).await;
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MarketDataProvider for CountingProvider {
        async fn fetch_indicators(&self, ticker: &Ticker) -> Result<RawIndicators, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if ticker.as_str() == "FAIL" {
                return Err(ProviderError::NoData(ticker.to_string()));
            }
            Ok(RawIndicators::default().with("priceToBook", 1.0))
        }

        async fn fetch_profile(&self, ticker: &Ticker) -> Result<CompanyProfile, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CompanyProfile {
                symbol: ticker.to_string(),
                ..Default::default()
            })
        }

        async fn fetch_history(
            &self,
            _ticker: &Ticker,
            start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<PricePoint>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![PricePoint { date: start, close: 1.0 }])
        }
    }

    fn cached() -> CachedProvider<CountingProvider> {
        CachedProvider::new(CountingProvider::default(), Duration::from_secs(60))
    }

    fn calls(p: &CachedProvider<CountingProvider>) -> usize {
        p.inner().calls.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_repeat_fetch_is_memoized() {
        let p = cached();
        let t = Ticker::new("aapl").unwrap();

        let first = p.fetch_indicators(&t).await.unwrap();
        let second = p.fetch_indicators(&t).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(calls(&p), 1);

        p.fetch_profile(&t).await.unwrap();
        p.fetch_profile(&t).await.unwrap();
        assert_eq!(calls(&p), 2);
        assert_eq!(p.len().await, 2);
    }

    #[tokio::test]
    async fn test_history_keyed_by_range() {
        let p = cached();
        let t = Ticker::new("MSFT").unwrap();
        let d = |y| NaiveDate::from_ymd_opt(y, 1, 1).unwrap();

        p.fetch_history(&t, d(2020), d(2021)).await.unwrap();
        p.fetch_history(&t, d(2020), d(2021)).await.unwrap();
        p.fetch_history(&t, d(2022), d(2023)).await.unwrap();
        assert_eq!(calls(&p), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let p = cached();
        let t = Ticker::new("FAIL").unwrap();

        assert!(p.fetch_indicators(&t).await.is_err());
        assert!(p.fetch_indicators(&t).await.is_err());
        assert_eq!(calls(&p), 2);
        assert_eq!(p.len().await, 0);
    }

    #[test]
    fn test_invalidate_all() {
        tokio_test::block_on(async {
            let p = cached();
            let t = Ticker::new("GOOG").unwrap();

            p.fetch_indicators(&t).await.unwrap();
            p.invalidate_all().await;
            assert_eq!(p.len().await, 0);

            p.fetch_indicators(&t).await.unwrap();
            assert_eq!(calls(&p), 2);
        });
    }
}
