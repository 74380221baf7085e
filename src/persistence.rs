use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use axum::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::nutrition::{plan::RecommendationPlan, wizard::Snapshot};

pub const SNAPSHOT_KEY: &str = "chatState";
pub const PLAN_KEY: &str = "lastRecommendations";
pub const SUMMARY_KEY: &str = "lastSummary";

/// String-valued storage partitioned by owner.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, owner: Uuid, key: &str) -> anyhow::Result<Option<String>>;
    async fn put(&self, owner: Uuid, key: &str, value: String) -> anyhow::Result<()>;
    async fn remove(&self, owner: Uuid, keys: &[&str]) -> anyhow::Result<()>;
}

pub struct PgKeyValueStore {
    db: PgPool,
}

impl PgKeyValueStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl KeyValueStore for PgKeyValueStore {
    async fn get(&self, owner: Uuid, key: &str) -> anyhow::Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>(
            r#"
            SELECT value
              FROM chat_storage
             WHERE user_id = $1 AND key = $2
            "#,
        )
        .bind(owner)
        .bind(key)
        .fetch_optional(&self.db)
        .await
        .context("select chat_storage")?;
        Ok(value)
    }

    async fn put(&self, owner: Uuid, key: &str, value: String) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO chat_storage (user_id, key, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, key)
            DO UPDATE SET value = EXCLUDED.value, updated_at = now()
            "#,
        )
        .bind(owner)
        .bind(key)
        .bind(value)
        .execute(&self.db)
        .await
        .context("upsert chat_storage")?;
        Ok(())
    }

    async fn remove(&self, owner: Uuid, keys: &[&str]) -> anyhow::Result<()> {
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        sqlx::query(r#"DELETE FROM chat_storage WHERE user_id = $1 AND key = ANY($2)"#)
            .bind(owner)
            .bind(keys)
            .execute(&self.db)
            .await
            .context("delete chat_storage")?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<HashMap<(Uuid, String), String>>,
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, owner: Uuid, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self
            .entries
            .read()
            .await
            .get(&(owner, key.to_string()))
            .cloned())
    }

    async fn put(&self, owner: Uuid, key: &str, value: String) -> anyhow::Result<()> {
        self.entries
            .write()
            .await
            .insert((owner, key.to_string()), value);
        Ok(())
    }

    async fn remove(&self, owner: Uuid, keys: &[&str]) -> anyhow::Result<()> {
        let mut entries = self.entries.write().await;
        for key in keys {
            entries.remove(&(owner, key.to_string()));
        }
        Ok(())
    }
}

/// Last successful recommendation of a user.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedResult {
    pub summary: String,
    pub plan: RecommendationPlan,
}

/// JSON layer over a [`KeyValueStore`]. Every failure is logged and treated
/// as "nothing stored"; callers never see storage errors.
#[derive(Clone)]
pub struct PersistenceBridge {
    store: Arc<dyn KeyValueStore>,
}

impl PersistenceBridge {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub async fn save_snapshot(&self, owner: Uuid, snapshot: &Snapshot) {
        self.write_json(owner, SNAPSHOT_KEY, snapshot).await;
    }

    pub async fn load_snapshot(&self, owner: Uuid) -> Option<Snapshot> {
        self.read_json(owner, SNAPSHOT_KEY).await
    }

    pub async fn save_result(&self, owner: Uuid, summary: &str, plan: &RecommendationPlan) {
        self.write_json(owner, SUMMARY_KEY, &summary).await;
        self.write_json(owner, PLAN_KEY, plan).await;
    }

    pub async fn load_result(&self, owner: Uuid) -> Option<SavedResult> {
        let summary = self.read_json::<String>(owner, SUMMARY_KEY).await?;
        let plan = self.read_json::<RecommendationPlan>(owner, PLAN_KEY).await?;
        Some(SavedResult { summary, plan })
    }

    pub async fn clear(&self, owner: Uuid) {
        if let Err(e) = self
            .store
            .remove(owner, &[SNAPSHOT_KEY, PLAN_KEY, SUMMARY_KEY])
            .await
        {
            warn!(error = %e, %owner, "failed to clear chat storage");
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, owner: Uuid, key: &str) -> Option<T> {
        let raw = match self.store.get(owner, key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, %owner, key, "chat storage unavailable");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, %owner, key, "discarding malformed chat storage entry");
                None
            }
        }
    }

    async fn write_json<T: Serialize + ?Sized>(&self, owner: Uuid, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, %owner, key, "failed to encode chat storage entry");
                return;
            }
        };
        match self.store.put(owner, key, raw).await {
            Ok(()) => debug!(%owner, key, "chat storage written"),
            Err(e) => warn!(error = %e, %owner, key, "failed to write chat storage"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::wizard::Wizard;
    use serde_json::json;

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _owner: Uuid, _key: &str) -> anyhow::Result<Option<String>> {
            anyhow::bail!("storage offline")
        }
        async fn put(&self, _owner: Uuid, _key: &str, _value: String) -> anyhow::Result<()> {
            anyhow::bail!("storage offline")
        }
        async fn remove(&self, _owner: Uuid, _keys: &[&str]) -> anyhow::Result<()> {
            anyhow::bail!("storage offline")
        }
    }

    fn memory_bridge() -> (Arc<MemoryKeyValueStore>, PersistenceBridge) {
        let store = Arc::new(MemoryKeyValueStore::default());
        let bridge = PersistenceBridge::new(store.clone());
        (store, bridge)
    }

    #[tokio::test]
    async fn snapshot_and_result_round_trip() {
        let (_, bridge) = memory_bridge();
        let owner = Uuid::new_v4();
        let mut wizard = Wizard::new();
        wizard.submit("70");

        bridge.save_snapshot(owner, &wizard.snapshot()).await;
        assert_eq!(bridge.load_snapshot(owner).await, Some(wizard.snapshot()));

        let plan: RecommendationPlan =
            serde_json::from_value(json!({ "Día 1": { "Merienda": { "Nombre del Plato": "Flan" } } }))
                .unwrap();
        bridge.save_result(owner, "Resumen de datos:", &plan).await;
        let saved = bridge.load_result(owner).await.unwrap();
        assert_eq!(saved.summary, "Resumen de datos:");
        assert_eq!(saved.plan, plan);

        assert!(bridge.load_snapshot(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn clear_removes_every_key() {
        let (store, bridge) = memory_bridge();
        let owner = Uuid::new_v4();
        bridge.save_snapshot(owner, &Wizard::new().snapshot()).await;
        bridge
            .save_result(owner, "x", &RecommendationPlan::default())
            .await;

        bridge.clear(owner).await;
        for key in [SNAPSHOT_KEY, PLAN_KEY, SUMMARY_KEY] {
            assert!(store.get(owner, key).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn malformed_entries_read_as_absent() {
        let (store, bridge) = memory_bridge();
        let owner = Uuid::new_v4();
        store.put(owner, SNAPSHOT_KEY, "{not json".into()).await.unwrap();
        store
            .put(owner, PLAN_KEY, r#"{"Lunes": {}}"#.into())
            .await
            .unwrap();
        store.put(owner, SUMMARY_KEY, r#""ok""#.into()).await.unwrap();

        assert!(bridge.load_snapshot(owner).await.is_none());
        assert!(bridge.load_result(owner).await.is_none());
    }

    #[tokio::test]
    async fn unavailable_store_degrades_silently() {
        let bridge = PersistenceBridge::new(Arc::new(BrokenStore));
        let owner = Uuid::new_v4();
        bridge.save_snapshot(owner, &Wizard::new().snapshot()).await;
        bridge.clear(owner).await;
        assert!(bridge.load_snapshot(owner).await.is_none());
        assert!(bridge.load_result(owner).await.is_none());
    }
}
