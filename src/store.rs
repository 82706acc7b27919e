use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client, RedisResult, aio::ConnectionManager};

use crate::config::StoreConfig;
use crate::error::StoreError;

/// The two primitives the service needs from the external key-value store.
#[async_trait]
pub trait LikeStore: Send + Sync {
    /// Atomically increments `key`, creating it at 1 when absent. Returns the new value.
    async fn incr(&self, key: &str) -> Result<i64, StoreError>;

    /// Bulk read. The result has one entry per key, in order, `None` for absent keys.
    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>, StoreError>;
}

pub struct RedisStore {
    manager: ConnectionManager,
    timeout: Duration,
}

impl RedisStore {
    pub async fn new(cfg: &StoreConfig) -> Result<Self, StoreError> {
        let timeout = cfg.timeout();
        let client = Client::open(cfg.url())?;

        tracing::info!(addr = %cfg.addr, tls = cfg.tls, "connecting to store");
        let manager = with_deadline(timeout, ConnectionManager::new(client)).await?;

        Ok(Self { manager, timeout })
    }
}

#[async_trait]
impl LikeStore for RedisStore {
    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut con = self.manager.clone();
        with_deadline(self.timeout, con.incr(key, 1i64)).await
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>, StoreError> {
        if keys.is_empty() {
            return Ok(vec![]);
        }

        // Explicit MGET: the typed helper downgrades single-key reads to GET.
        let mut con = self.manager.clone();
        let raw: Vec<Option<Vec<u8>>> = with_deadline(
            self.timeout,
            redis::cmd("MGET").arg(keys).query_async(&mut con),
        )
        .await?;

        Ok(raw
            .into_iter()
            .map(|v| v.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
            .collect())
    }
}

async fn with_deadline<T>(
    timeout: Duration,
    fut: impl Future<Output = RedisResult<T>>,
) -> Result<T, StoreError> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(StoreError::Timeout(timeout)),
    }
}

#[cfg(test)]
pub mod memory {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use redis::ErrorKind;

    use super::LikeStore;
    use crate::error::StoreError;

    /// In-process stand-in for the key-value store.
    #[derive(Default)]
    pub struct MemoryStore {
        data: Mutex<HashMap<String, String>>,
    }

    impl MemoryStore {
        pub fn set(&self, key: &str, value: &str) {
            self.data
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
        }

        pub fn get(&self, key: &str) -> Option<String> {
            self.data.lock().unwrap().get(key).cloned()
        }

        pub fn len(&self) -> usize {
            self.data.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LikeStore for MemoryStore {
        async fn incr(&self, key: &str) -> Result<i64, StoreError> {
            let mut data = self.data.lock().unwrap();
            let current = match data.get(key) {
                Some(v) => v.parse::<i64>().map_err(|_| {
                    StoreError::from(redis::RedisError::from((
                        ErrorKind::TypeError,
                        "value is not an integer or out of range",
                    )))
                })?,
                None => 0,
            };
            data.insert(key.to_string(), (current + 1).to_string());
            Ok(current + 1)
        }

        async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>, StoreError> {
            let data = self.data.lock().unwrap();
            Ok(keys.iter().map(|k| data.get(k).cloned()).collect())
        }
    }

    /// A store that is never reachable.
    pub struct DownStore;

    #[async_trait]
    impl LikeStore for DownStore {
        async fn incr(&self, _key: &str) -> Result<i64, StoreError> {
            Err(StoreError::Timeout(Duration::from_millis(5)))
        }

        async fn get_many(&self, _keys: &[String]) -> Result<Vec<Option<String>>, StoreError> {
            Err(StoreError::Timeout(Duration::from_millis(5)))
        }
    }

    #[tokio::test]
    async fn test_memory_incr_creates_then_increments() {
        let store = MemoryStore::default();
        assert_eq!(store.incr("like:1").await.unwrap(), 1);
        assert_eq!(store.incr("like:1").await.unwrap(), 2);
        assert_eq!(store.get("like:1").as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_memory_incr_rejects_non_integer() {
        let store = MemoryStore::default();
        store.set("like:1", "abc");
        assert!(store.incr("like:1").await.is_err());
    }
}
