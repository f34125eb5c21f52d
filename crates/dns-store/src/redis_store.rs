use crate::{decode_serial, RecordStore, StoreError, SERIAL_NUMBER_KEY};
use anyhow::Context;
use async_trait::async_trait;
use deadpool::managed::{Manager, Metrics, Object, Pool, RecycleError, RecycleResult};
use dns_record::Document;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::Client;
use std::time::Duration;

/// Connection parameters for the backing store. The URL carries host, port,
/// optional password and database number; the remaining knobs govern the
/// pool. The fixed 2s connect/response timeouts bound how long a single
/// question can stall on the store.
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    pub url: String,
    /// Maximum number of pooled connections. Default is 10.
    pub pool_size: Option<usize>,
    pub connect_timeout: Duration,
    pub response_timeout: Duration,
    pub wait_timeout: Duration,
}

impl RedisStoreConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            pool_size: None,
            connect_timeout: Duration::from_secs(2),
            response_timeout: Duration::from_secs(2),
            wait_timeout: Duration::from_secs(2),
        }
    }
}

struct ClientManager {
    client: Client,
    config: ConnectionManagerConfig,
}

impl Manager for ClientManager {
    type Type = ConnectionManager;
    type Error = anyhow::Error;

    async fn create(&self) -> Result<Self::Type, Self::Error> {
        Ok(ConnectionManager::new_with_config(self.client.clone(), self.config.clone()).await?)
    }

    async fn recycle(
        &self,
        conn: &mut Self::Type,
        _metrics: &Metrics,
    ) -> RecycleResult<anyhow::Error> {
        let pong: Result<(), redis::RedisError> = redis::cmd("PING").query_async(conn).await;
        pong.map_err(|err| RecycleError::message(format!("{err:#}")))
    }
}

/// The Redis-backed [`RecordStore`]. Uses only GET, SET, DEL, MGET and KEYS
/// plus the well-known serial key.
pub struct RedisStore {
    pool: Pool<ClientManager>,
}

impl RedisStore {
    pub fn open(config: RedisStoreConfig) -> anyhow::Result<Self> {
        let client = Client::open(config.url.as_str())
            .with_context(|| format!("building redis client for {}", config.url))?;

        let manager_config = ConnectionManagerConfig::new()
            .set_connection_timeout(config.connect_timeout)
            .set_response_timeout(config.response_timeout);

        let mut builder = Pool::builder(ClientManager {
            client,
            config: manager_config,
        })
        .runtime(deadpool::Runtime::Tokio1)
        .create_timeout(Some(config.connect_timeout))
        .wait_timeout(Some(config.wait_timeout));

        if let Some(limit) = config.pool_size {
            builder = builder.max_size(limit);
        }

        Ok(Self {
            pool: builder.build()?,
        })
    }

    async fn conn(&self) -> Result<Object<ClientManager>, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|err| StoreError::Unavailable(format!("{err:#}")))
    }
}

fn unavailable(err: redis::RedisError) -> StoreError {
    StoreError::Unavailable(format!("{err:#}"))
}

#[async_trait]
impl RecordStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError> {
        let key = key.to_ascii_lowercase();
        let mut conn = self.conn().await?;
        let bytes: Option<Vec<u8>> = redis::cmd("GET")
            .arg(&key)
            .query_async(&mut *conn)
            .await
            .map_err(unavailable)?;

        match bytes {
            None => Ok(None),
            Some(bytes) => Document::decode(&bytes)
                .map(Some)
                .map_err(|err| StoreError::Malformed {
                    key,
                    error: err.to_string(),
                }),
        }
    }

    async fn put(&self, key: &str, doc: &Document) -> Result<(), StoreError> {
        let bytes = doc.encode().map_err(|err| StoreError::Malformed {
            key: key.to_string(),
            error: err.to_string(),
        })?;
        let mut conn = self.conn().await?;
        let written: Result<(), redis::RedisError> = redis::cmd("SET")
            .arg(key.to_ascii_lowercase())
            .arg(bytes)
            .query_async(&mut *conn)
            .await;
        written.map_err(unavailable)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn().await?;
        let deleted: i64 = redis::cmd("DEL")
            .arg(key.to_ascii_lowercase())
            .query_async(&mut *conn)
            .await
            .map_err(unavailable)?;
        Ok(deleted > 0)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn().await?;
        redis::cmd("KEYS")
            .arg(pattern)
            .query_async(&mut *conn)
            .await
            .map_err(unavailable)
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Document>>, StoreError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.conn().await?;
        let mut cmd = redis::cmd("MGET");
        for key in keys {
            cmd.arg(key.to_ascii_lowercase());
        }
        let values: Vec<Option<Vec<u8>>> =
            cmd.query_async(&mut *conn).await.map_err(unavailable)?;

        let mut documents = Vec::with_capacity(values.len());
        for (key, value) in keys.iter().zip(values) {
            documents.push(match value {
                None => None,
                Some(bytes) => match Document::decode(&bytes) {
                    Ok(doc) => Some(doc),
                    Err(err) => {
                        tracing::warn!("skipping undecodable document at '{key}': {err:#}");
                        None
                    }
                },
            });
        }
        Ok(documents)
    }

    async fn serial_number(&self) -> Result<u32, StoreError> {
        let mut conn = self.conn().await?;
        let bytes: Option<Vec<u8>> = redis::cmd("GET")
            .arg(SERIAL_NUMBER_KEY)
            .query_async(&mut *conn)
            .await
            .map_err(unavailable)?;
        Ok(decode_serial(bytes))
    }
}
