use chrono::{DateTime, Duration, Utc};
use shared::Verdict;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::storage::StoredImage;

/// The latest analysis of one session.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub verdict: Verdict,
    pub original: StoredImage,
    pub suspected: StoredImage,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(verdict: Verdict, original: StoredImage, suspected: StoredImage) -> Self {
        Self {
            verdict,
            original,
            suspected,
            created_at: Utc::now(),
        }
    }
}

/// In-memory results keyed by session id. One record per session; a new
/// analysis replaces the old one.
#[derive(Clone)]
pub struct SessionStore {
    records: Arc<RwLock<HashMap<Uuid, SessionRecord>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn put(&self, session_id: Uuid, record: SessionRecord) {
        let previous = self.records.write().await.insert(session_id, record);
        if previous.is_some() {
            log::debug!("Replaced previous result for session {}", session_id);
        }
    }

    pub async fn get(&self, session_id: Uuid) -> Option<SessionRecord> {
        let records = self.records.read().await;
        records
            .get(&session_id)
            .filter(|record| !self.is_expired(record, Utc::now()))
            .cloned()
    }

    pub async fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| !self.is_expired(record, now));
        before - records.len()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    fn is_expired(&self, record: &SessionRecord, now: DateTime<Utc>) -> bool {
        now - record.created_at > self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Confidence;
    use std::path::PathBuf;

    fn stored(name: &str) -> StoredImage {
        StoredImage {
            path: PathBuf::from("/tmp").join(name),
            session_id: Uuid::nil(),
            file_name: name.to_string(),
        }
    }

    fn record(rationale: &str) -> SessionRecord {
        SessionRecord::new(
            Verdict::determined(false, Confidence::Medium, rationale.to_string()),
            stored("original_a.png"),
            stored("suspected_b.png"),
        )
    }

    #[actix_web::test]
    async fn later_analysis_overwrites_earlier() {
        let store = SessionStore::new(Duration::hours(1));
        let id = Uuid::new_v4();
        store.put(id, record("first")).await;
        store.put(id, record("second")).await;

        assert_eq!(store.get(id).await.unwrap().verdict.rationale, "second");
        assert_eq!(store.len().await, 1);
    }

    #[actix_web::test]
    async fn sessions_are_isolated() {
        let store = SessionStore::new(Duration::hours(1));
        let a = Uuid::new_v4();
        store.put(a, record("mine")).await;
        assert!(store.get(Uuid::new_v4()).await.is_none());
        assert!(store.get(a).await.is_some());
    }

    #[actix_web::test]
    async fn expired_records_are_hidden_and_evicted() {
        let store = SessionStore::new(Duration::minutes(30));
        let fresh = Uuid::new_v4();
        let stale = Uuid::new_v4();
        store.put(fresh, record("fresh")).await;
        let mut old = record("stale");
        old.created_at = Utc::now() - Duration::hours(2);
        store.put(stale, old).await;

        assert!(store.get(stale).await.is_none());
        assert_eq!(store.evict_expired(Utc::now()).await, 1);
        assert_eq!(store.len().await, 1);
        assert!(store.get(fresh).await.is_some());
    }
}
