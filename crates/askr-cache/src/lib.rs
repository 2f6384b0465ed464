//! Tiered answer cache using moka
//!
//! Answers are keyed by `(tier, question, role)` and expire passively after a
//! TTL chosen per write. Keys compare the question verbatim: case and
//! whitespace variants are distinct entries. The cache is internally
//! synchronized; concurrent misses on one key may both compute and both
//! write, the later write winning.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

use askr_core::{Role, Tier};
use moka::future::Cache;
use moka::Expiry;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Composite cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    tier: Tier,
    question: String,
    role: Role,
}

impl CacheKey {
    /// Create key for a question asked under `role` at `tier`
    #[inline]
    #[must_use]
    pub fn new(tier: Tier, question: impl Into<String>, role: Role) -> Self {
        Self {
            tier,
            question: question.into(),
            role,
        }
    }

    /// Tier namespace
    #[inline]
    #[must_use]
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Role the answer was computed for
    #[inline]
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Question text, verbatim
    #[inline]
    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    /// Short stable digest (first 16 hex chars of Blake3), safe to log
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.tier.as_str().as_bytes());
        hasher.update(&[0]);
        hasher.update(self.role.as_str().as_bytes());
        hasher.update(&[0]);
        hasher.update(self.question.as_bytes());
        hex::encode(&hasher.finalize().as_bytes()[..8])
    }
}

#[derive(Debug, Clone)]
struct CachedAnswer {
    answer: Arc<str>,
    ttl: Duration,
}

/// Expiry honoring the TTL carried by each value; a rewrite restarts it
struct PerEntryTtl;

impl Expiry<CacheKey, CachedAnswer> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        value: &CachedAnswer,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &CacheKey,
        value: &CachedAnswer,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Approximate number of live entries
    pub entry_count: u64,
}

/// Concurrent answer cache shared by all tiers
#[derive(Debug, Clone)]
pub struct AnswerCache {
    inner: Cache<CacheKey, CachedAnswer>,
}

impl AnswerCache {
    /// Create cache holding at most `max_capacity` answers
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }

    /// Look up a previously computed answer
    pub async fn get(&self, tier: Tier, question: &str, role: Role) -> Option<String> {
        let key = CacheKey::new(tier, question, role);
        let hit = self.inner.get(&key).await;
        let outcome = if hit.is_some() { "hit" } else { "miss" };

        tracing::debug!(
            tier = %tier,
            role = %role,
            key = %key.fingerprint(),
            outcome,
            "Answer cache lookup"
        );
        metrics::counter!(
            "askr_cache_lookups_total",
            "tier" => tier.as_str(),
            "outcome" => outcome
        )
        .increment(1);

        hit.map(|cached| cached.answer.to_string())
    }

    /// Store an answer, replacing any previous one for the same key
    pub async fn put(
        &self,
        tier: Tier,
        question: &str,
        role: Role,
        answer: impl Into<String>,
        ttl: Duration,
    ) {
        let key = CacheKey::new(tier, question, role);
        tracing::debug!(
            tier = %tier,
            role = %role,
            key = %key.fingerprint(),
            ttl_secs = ttl.as_secs(),
            "Answer cached"
        );
        let answer: String = answer.into();
        self.inner
            .insert(
                key,
                CachedAnswer {
                    answer: Arc::from(answer),
                    ttl,
                },
            )
            .await;
    }

    /// Drop one entry
    pub async fn invalidate(&self, tier: Tier, question: &str, role: Role) {
        self.inner
            .invalidate(&CacheKey::new(tier, question, role))
            .await;
    }

    /// Drop every entry
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Flush moka's pending maintenance so counts are exact
    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
    }

    /// Get cache statistics
    #[inline]
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.inner.entry_count(),
        }
    }
}

impl Default for AnswerCache {
    /// Create cache with default capacity (10,000 entries)
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn put_then_get() {
        let cache = AnswerCache::default();
        cache
            .put(Tier::Structured, "Leave Policy", Role::It, "20 days", HOUR)
            .await;

        assert_eq!(
            cache.get(Tier::Structured, "Leave Policy", Role::It).await.as_deref(),
            Some("20 days")
        );
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let cache = AnswerCache::default();
        assert!(cache.get(Tier::Search, "anything", Role::User).await.is_none());
    }

    #[tokio::test]
    async fn tiers_and_roles_are_separate_namespaces() {
        let cache = AnswerCache::default();
        cache
            .put(Tier::Structured, "q", Role::It, "structured for IT", HOUR)
            .await;

        assert!(cache.get(Tier::Search, "q", Role::It).await.is_none());
        assert!(cache.get(Tier::Structured, "q", Role::Hr).await.is_none());
        assert!(cache.get(Tier::Structured, "q", Role::Admin).await.is_none());
    }

    #[tokio::test]
    async fn question_is_not_normalized() {
        let cache = AnswerCache::default();
        cache
            .put(Tier::Structured, "Leave Policy", Role::It, "20 days", HOUR)
            .await;

        assert!(cache.get(Tier::Structured, "leave policy", Role::It).await.is_none());
        assert!(cache.get(Tier::Structured, "Leave Policy ", Role::It).await.is_none());
        assert!(cache.get(Tier::Structured, "Leave  Policy", Role::It).await.is_none());
    }

    #[tokio::test]
    async fn write_overwrites() {
        let cache = AnswerCache::default();
        cache.put(Tier::Search, "q", Role::Hr, "first", HOUR).await;
        cache.put(Tier::Search, "q", Role::Hr, "second", HOUR).await;

        assert_eq!(
            cache.get(Tier::Search, "q", Role::Hr).await.as_deref(),
            Some("second")
        );
        cache.run_pending_tasks().await;
        assert_eq!(cache.stats().entry_count, 1);
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = AnswerCache::default();
        cache
            .put(Tier::Search, "q", Role::It, "short lived", Duration::from_millis(100))
            .await;
        cache.put(Tier::Structured, "q", Role::It, "long lived", HOUR).await;

        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(cache.get(Tier::Search, "q", Role::It).await.is_none());
        assert_eq!(
            cache.get(Tier::Structured, "q", Role::It).await.as_deref(),
            Some("long lived")
        );
    }

    #[tokio::test]
    async fn rewrite_restarts_ttl() {
        let cache = AnswerCache::default();
        cache.put(Tier::Search, "q", Role::It, "v1", HOUR).await;
        cache
            .put(Tier::Search, "q", Role::It, "v2", Duration::from_millis(100))
            .await;

        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(cache.get(Tier::Search, "q", Role::It).await.is_none());
    }

    #[tokio::test]
    async fn invalidation() {
        let cache = AnswerCache::default();
        cache.put(Tier::Structured, "a", Role::It, "1", HOUR).await;
        cache.put(Tier::Structured, "b", Role::It, "2", HOUR).await;

        cache.invalidate(Tier::Structured, "a", Role::It).await;
        assert!(cache.get(Tier::Structured, "a", Role::It).await.is_none());
        assert!(cache.get(Tier::Structured, "b", Role::It).await.is_some());

        cache.invalidate_all();
        assert!(cache.get(Tier::Structured, "b", Role::It).await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writers_and_readers() {
        let cache = AnswerCache::default();
        let mut handles = Vec::new();

        for i in 0..32 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .put(Tier::Search, "shared", Role::User, "same answer", HOUR)
                    .await;
                cache
                    .put(Tier::Search, &format!("q{i}"), Role::User, format!("a{i}"), HOUR)
                    .await;
                cache.get(Tier::Search, "shared", Role::User).await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().as_deref(), Some("same answer"));
        }
        cache.run_pending_tasks().await;
        assert_eq!(cache.stats().entry_count, 33);
    }

    #[test]
    fn fingerprint_is_stable_and_short() {
        let a = CacheKey::new(Tier::Structured, "Leave Policy", Role::It);
        let b = CacheKey::new(Tier::Structured, "Leave Policy", Role::It);
        let c = CacheKey::new(Tier::Search, "Leave Policy", Role::It);

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 16);
    }

    proptest! {
        #[test]
        fn prop_equal_inputs_equal_keys(question in ".{0,40}", other in ".{0,40}") {
            let a = CacheKey::new(Tier::Search, question.clone(), Role::Hr);
            let b = CacheKey::new(Tier::Search, other.clone(), Role::Hr);
            prop_assert_eq!(a == b, question == other);
            if question == other {
                prop_assert_eq!(a.fingerprint(), b.fingerprint());
            }
        }
    }
}
