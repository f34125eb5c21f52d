//! Store adapter: reads and writes one record document per fully qualified
//! name.
//!
//! This crate is the only place that knows how storage keys are derived
//! from a (domain, label) pair, including the `$.` escape that keeps
//! wildcard records out of the store's own pattern syntax. Everything else
//! goes through [`RecordStore`].

use async_trait::async_trait;
use dns_record::Document;
use thiserror::Error;

mod key;
mod memory;
pub mod pattern;
mod redis_store;

pub use key::{display_key, record_key, zone_members_pattern, WILDCARD_LABEL};
pub use memory::MemoryStore;
pub use redis_store::{RedisStore, RedisStoreConfig};

/// The well-known key holding the zone serial as a little-endian u32.
pub const SERIAL_NUMBER_KEY: &str = "dns-server-serial-no";

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store call failed or timed out. The query path treats this as
    /// "no record"; the mutation path surfaces it.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The stored payload did not decode as a record document. The mutation
    /// path refuses to overwrite such a key.
    #[error("malformed document at key '{key}': {error}")]
    Malformed { key: String, error: String },
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch and decode the document at `key`. Strict: a malformed payload
    /// is an error, so read-modify-write cannot silently destroy data.
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError>;

    /// Overwrite the document at `key`. No compare-and-swap; concurrent
    /// writers are serialised by convention (single leader or human).
    async fn put(&self, key: &str, doc: &Document) -> Result<(), StoreError>;

    /// Returns whether a document was actually deleted.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Enumerate keys matching a glob pattern (`*` and `?`). Administrative
    /// surfaces only; the resolver hot path never scans.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError>;

    /// Batch fetch. Lenient: entries that are missing or undecodable come
    /// back as `None` (undecodable ones are logged at warn with their key).
    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Document>>, StoreError>;

    /// The zone serial. Missing values and anything that is not exactly
    /// four bytes read as 0.
    async fn serial_number(&self) -> Result<u32, StoreError>;

    /// Resolve a query name: the exact key wins; otherwise, for names of at
    /// least three labels, fall back to the wildcard key with the leftmost
    /// label replaced.
    async fn lookup(&self, qname: &str) -> Result<Option<Document>, StoreError> {
        let qname = qname.to_ascii_lowercase();
        if let Some(doc) = self.get(&qname).await? {
            return Ok(Some(doc));
        }

        let mut labels: Vec<&str> = qname.split('.').collect();
        if labels.len() > 2 {
            labels[0] = WILDCARD_LABEL;
            return self.get(&labels.join(".")).await;
        }

        Ok(None)
    }
}

/// Decode the serial payload: exactly four little-endian bytes, or 0.
pub(crate) fn decode_serial(bytes: Option<Vec<u8>>) -> u32 {
    match bytes {
        Some(bytes) => match <[u8; 4]>::try_from(bytes.as_slice()) {
            Ok(le) => u32::from_le_bytes(le),
            Err(_) => 0,
        },
        None => 0,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn serial_decoding() {
        assert_eq!(decode_serial(None), 0);
        assert_eq!(decode_serial(Some(vec![])), 0);
        assert_eq!(decode_serial(Some(vec![1, 2, 3])), 0);
        assert_eq!(decode_serial(Some(vec![0x2a, 0, 0, 0])), 42);
        assert_eq!(decode_serial(Some(vec![1, 2, 3, 4, 5])), 0);
    }
}
