use std::collections::HashMap;
use std::time::Duration;
use std::time::Instant;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::user::models::User;

struct CacheEntry {
    principal: User,
    expires_at: Instant,
}

/// Short-TTL cache mapping a token subject to its resolved principal.
///
/// Saves the store round trip on every authenticated request. Entries are
/// replaced wholesale, never mutated in place, so readers and writers only
/// contend on the map itself. There is no push invalidation: an account
/// disabled after caching stays resolvable until its entry expires, which
/// bounds staleness by the TTL.
pub struct PrincipalCache {
    entries: RwLock<HashMap<Uuid, CacheEntry>>,
    ttl: Duration,
}

impl PrincipalCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Look up a principal, dropping the entry when it has expired.
    pub async fn get(&self, id: &Uuid) -> Option<User> {
        {
            let entries = self.entries.read().await;
            match entries.get(id) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Some(entry.principal.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: take the write lock only for the removal.
        self.entries.write().await.remove(id);
        None
    }

    /// Insert or replace a principal with a fresh TTL window.
    pub async fn insert(&self, principal: User) {
        let entry = CacheEntry {
            expires_at: Instant::now() + self.ttl,
            principal,
        };

        self.entries.write().await.insert(entry.principal.id, entry);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn principal(id: Uuid) -> User {
        User {
            id,
            department_id: Uuid::new_v4(),
            name: "Test User".to_string(),
            cpf: "01234567890".to_string(),
            email: Some("test@example.com".to_string()),
            phone: None,
            is_active: true,
            is_verified: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
            management: None,
        }
    }

    #[tokio::test]
    async fn test_hit_within_ttl() {
        let cache = PrincipalCache::new(Duration::from_secs(60));
        let id = Uuid::new_v4();

        cache.insert(principal(id)).await;

        let hit = cache.get(&id).await;
        assert_eq!(hit.map(|u| u.id), Some(id));
    }

    #[tokio::test]
    async fn test_miss_for_unknown_subject() {
        let cache = PrincipalCache::new(Duration::from_secs(60));
        assert!(cache.get(&Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_entry_expires() {
        let cache = PrincipalCache::new(Duration::from_millis(20));
        let id = Uuid::new_v4();

        cache.insert(principal(id)).await;
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(cache.get(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_reinsert_refreshes_window() {
        let cache = PrincipalCache::new(Duration::from_millis(50));
        let id = Uuid::new_v4();

        cache.insert(principal(id)).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        cache.insert(principal(id)).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        // 60ms after the first insert, but only 30ms after the second.
        assert!(cache.get(&id).await.is_some());
    }
}
