use crate::pattern::glob_matches;
use crate::{decode_serial, RecordStore, StoreError, SERIAL_NUMBER_KEY};
use async_trait::async_trait;
use dns_record::Document;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// An in-memory [`RecordStore`] with the same keyspace semantics as the
/// Redis adapter, including the serial key living alongside the documents.
/// Used by the test suites in place of a live server.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_serial(&self, serial: u32) {
        self.data.lock().unwrap().insert(
            SERIAL_NUMBER_KEY.to_string(),
            serial.to_le_bytes().to_vec(),
        );
    }

    /// Plant raw bytes at a key, for exercising the malformed-document
    /// paths.
    pub fn set_raw(&self, key: &str, bytes: Vec<u8>) {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_ascii_lowercase(), bytes);
    }

    pub fn len(&self) -> usize {
        self.data.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError> {
        let key = key.to_ascii_lowercase();
        let data = self.data.lock().unwrap();
        match data.get(&key) {
            None => Ok(None),
            Some(bytes) => Document::decode(bytes)
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
        self.data
            .lock()
            .unwrap()
            .insert(key.to_ascii_lowercase(), bytes);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .remove(&key.to_ascii_lowercase())
            .is_some())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let data = self.data.lock().unwrap();
        Ok(data
            .keys()
            .filter(|k| glob_matches(pattern, k))
            .cloned()
            .collect())
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Document>>, StoreError> {
        let data = self.data.lock().unwrap();
        Ok(keys
            .iter()
            .map(|key| {
                let key = key.to_ascii_lowercase();
                data.get(&key).and_then(|bytes| match Document::decode(bytes) {
                    Ok(doc) => Some(doc),
                    Err(err) => {
                        tracing::warn!("skipping undecodable document at '{key}': {err:#}");
                        None
                    }
                })
            })
            .collect())
    }

    async fn serial_number(&self) -> Result<u32, StoreError> {
        let bytes = self.data.lock().unwrap().get(SERIAL_NUMBER_KEY).cloned();
        Ok(decode_serial(bytes))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::record_key;

    fn doc(domain: &str) -> Document {
        Document::new(domain)
    }

    #[tokio::test]
    async fn get_put_delete_round_trip() {
        let store = MemoryStore::new();
        let key = record_key("example.com", "web");
        store.put(&key, &doc("example.com")).await.unwrap();
        assert!(store.get(&key).await.unwrap().is_some());
        assert!(store.delete(&key).await.unwrap());
        assert!(!store.delete(&key).await.unwrap());
        assert!(store.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lookup_is_case_insensitive() {
        let store = MemoryStore::new();
        store
            .put("web.example.com", &doc("example.com"))
            .await
            .unwrap();
        assert!(store.get("WEB.Example.COM").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn exact_key_beats_wildcard() {
        let store = MemoryStore::new();
        store
            .put("$.example.com", &doc("example.com"))
            .await
            .unwrap();
        let mut exact = doc("example.com");
        exact.txt = Some(dns_record::RecordSet {
            weighted: false,
            addresses: vec![dns_record::NameAddress::new("exact")],
        });
        store.put("web.example.com", &exact).await.unwrap();

        let found = store.lookup("web.example.com").await.unwrap().unwrap();
        assert!(found.txt.is_some(), "expected the exact document");
    }

    #[tokio::test]
    async fn wildcard_fallback_needs_three_labels() {
        let store = MemoryStore::new();
        store
            .put("$.example.com", &doc("example.com"))
            .await
            .unwrap();

        assert!(store
            .lookup("anything.example.com")
            .await
            .unwrap()
            .is_some());
        // two labels never fall through to the wildcard
        assert!(store.lookup("example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_documents_are_strict_on_get_lenient_on_get_many() {
        let store = MemoryStore::new();
        store.set_raw("bad.example.com", b"{not json".to_vec());
        assert!(matches!(
            store.get("bad.example.com").await,
            Err(StoreError::Malformed { .. })
        ));

        let docs = store
            .get_many(&["bad.example.com".to_string()])
            .await
            .unwrap();
        assert_eq!(docs, vec![None]);
    }

    #[tokio::test]
    async fn serial_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.serial_number().await.unwrap(), 0);
        store.set_serial(42);
        k9::assert_equal!(store.serial_number().await.unwrap(), 42);
        store.set_raw(SERIAL_NUMBER_KEY, vec![1, 2]);
        assert_eq!(store.serial_number().await.unwrap(), 0);
    }
}
