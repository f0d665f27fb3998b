use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub user_id: String,
    pub message: String,
    pub chatbot: String,
}

impl CacheKey {
    pub fn new(user_id: &str, message: &str, chatbot: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            message: message.to_string(),
            chatbot: chatbot.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    reply: String,
    stored_at: Instant,
}

/// In-process reply cache with a fixed time-to-live.
///
/// Expired entries are dropped lazily when looked up and swept on every insert,
/// so nothing outlives the cache itself.
#[derive(Debug)]
pub struct ReplyCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl ReplyCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<String> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = entries.get(key) {
            if entry.stored_at.elapsed() < self.ttl {
                return Some(entry.reply.clone());
            }
            entries.remove(key);
        }
        None
    }

    pub fn insert(&self, key: CacheKey, reply: String) {
        let now = Instant::now();
        let ttl = self.ttl;
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, entry| now.duration_since(entry.stored_at) < ttl);
        entries.insert(key, CacheEntry { reply, stored_at: now });
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    #[tokio::test(start_paused = true)]
    async fn hit_before_ttl() {
        let cache = ReplyCache::new(TTL);
        let key = CacheKey::new("u1", "hello", "deepparag/Aeona");
        cache.insert(key.clone(), "hi there".into());

        tokio::time::advance(TTL - Duration::from_millis(1)).await;
        assert_eq!(cache.get(&key).as_deref(), Some("hi there"));
    }

    #[tokio::test(start_paused = true)]
    async fn expires_exactly_at_ttl() {
        let cache = ReplyCache::new(TTL);
        let key = CacheKey::new("u1", "hello", "deepparag/Aeona");
        cache.insert(key.clone(), "hi there".into());

        tokio::time::advance(TTL).await;
        assert_eq!(cache.get(&key), None);
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn overwrite_restarts_lifetime() {
        let cache = ReplyCache::new(TTL);
        let key = CacheKey::new("u1", "hello", "bot");
        cache.insert(key.clone(), "first".into());
        tokio::time::advance(Duration::from_secs(200)).await;
        cache.insert(key.clone(), "second".into());
        tokio::time::advance(Duration::from_secs(200)).await;
        assert_eq!(cache.get(&key).as_deref(), Some("second"));
    }

    #[tokio::test(start_paused = true)]
    async fn insert_sweeps_expired_entries() {
        let cache = ReplyCache::new(TTL);
        cache.insert(CacheKey::new("u1", "a", "bot"), "old".into());
        tokio::time::advance(TTL).await;
        cache.insert(CacheKey::new("u2", "b", "bot"), "new".into());
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn key_fields_do_not_collide() {
        let cache = ReplyCache::new(TTL);
        cache.insert(CacheKey::new("ab", "c", "bot"), "one".into());
        assert_eq!(cache.get(&CacheKey::new("a", "bc", "bot")), None);
    }
}
