//! In-memory proxy resource store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use ocn_types::PartyId;

use crate::domain::errors::RelayError;
use crate::ports::ProxyResourceStore;

#[derive(Debug, Clone)]
struct ProxyRecord {
    resource: String,
    sender: PartyId,
    receiver: PartyId,
    alternative_id: Option<String>,
    created_at: Instant,
}

type AltKey = (String, PartyId, PartyId);

/// `DashMap`-backed store: records keyed by primary id, plus an index of
/// `(alternative id, sender, receiver)` to primary id for hand-offs minted
/// on the other side of a relay.
#[derive(Default)]
pub struct InMemoryProxyStore {
    counter: AtomicU64,
    records: DashMap<String, ProxyRecord>,
    alt_index: DashMap<AltKey, String>,
}

impl InMemoryProxyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records currently held. Housekeeping logs this.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl ProxyResourceStore for InMemoryProxyStore {
    async fn create(
        &self,
        resource: &str,
        sender: &PartyId,
        receiver: &PartyId,
        alternative_id: Option<String>,
    ) -> Result<String, RelayError> {
        let id = (self.counter.fetch_add(1, Ordering::SeqCst) + 1).to_string();

        if let Some(alt) = &alternative_id {
            let key = (alt.clone(), sender.clone(), receiver.clone());
            // Last write wins; the superseded record must not linger.
            if let Some((_, old_primary)) = self.alt_index.remove(&key) {
                self.records.remove(&old_primary);
            }
            self.alt_index.insert(key, id.clone());
        }

        self.records.insert(
            id.clone(),
            ProxyRecord {
                resource: resource.to_string(),
                sender: sender.clone(),
                receiver: receiver.clone(),
                alternative_id,
                created_at: Instant::now(),
            },
        );
        Ok(id)
    }

    async fn resolve(
        &self,
        id: &str,
        sender: &PartyId,
        receiver: &PartyId,
    ) -> Result<String, RelayError> {
        let alt_key = (id.to_string(), sender.clone(), receiver.clone());
        if let Some(primary) = self.alt_index.get(&alt_key) {
            if let Some(record) = self.records.get(primary.value()) {
                return Ok(record.resource.clone());
            }
        }

        if let Some(record) = self.records.get(id) {
            if record.sender == *sender && record.receiver == *receiver {
                return Ok(record.resource.clone());
            }
        }

        Err(RelayError::UnknownResource { id: id.to_string() })
    }

    async fn delete(&self, id: &str) -> Result<(), RelayError> {
        if let Some((_, record)) = self.records.remove(id) {
            if let Some(alt) = record.alternative_id {
                self.alt_index.remove(&(alt, record.sender, record.receiver));
            }
            return Ok(());
        }

        // The id may be an alternative id. Idempotent either way.
        let indexed: Vec<(AltKey, String)> = self
            .alt_index
            .iter()
            .filter(|entry| entry.key().0 == id)
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        for (key, primary) in indexed {
            self.alt_index.remove(&key);
            self.records.remove(&primary);
        }
        Ok(())
    }

    async fn purge_expired(&self, max_age: Duration) -> Result<usize, RelayError> {
        let now = Instant::now();
        let expired: Vec<(String, Option<AltKey>)> = self
            .records
            .iter()
            .filter(|entry| now.duration_since(entry.value().created_at) >= max_age)
            .map(|entry| {
                let record = entry.value();
                let alt_key = record
                    .alternative_id
                    .clone()
                    .map(|alt| (alt, record.sender.clone(), record.receiver.clone()));
                (entry.key().clone(), alt_key)
            })
            .collect();

        let mut removed = 0;
        for (id, alt_key) in expired {
            if self.records.remove(&id).is_some() {
                removed += 1;
            }
            if let Some(key) = alt_key {
                self.alt_index.remove(&key);
            }
        }
        Ok(removed)
    }
}
