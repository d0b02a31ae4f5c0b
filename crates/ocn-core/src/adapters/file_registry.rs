//! JSON-file registry adapter.
//!
//! The network-wide registry is distilled to a static JSON document mapping
//! parties to the base URL and signing address of their operating node. A
//! party is locally operated when its node URL equals this node's own.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use ocn_notary::Address;
use ocn_types::PartyId;

use crate::domain::errors::RelayError;
use crate::ports::RegistryApi;

/// One registry document entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub country_code: String,
    pub party_id: String,
    pub node_url: String,
    /// Hex-encoded 20-byte signing address of the operating node.
    pub node_address: String,
}

#[derive(Debug, Clone)]
struct NodeOfRecord {
    url: String,
    address: Address,
}

/// Immutable registry loaded at startup.
pub struct FileRegistry {
    own_url: String,
    entries: HashMap<PartyId, NodeOfRecord>,
}

impl FileRegistry {
    pub fn from_entries(
        own_url: impl Into<String>,
        raw: Vec<RegistryEntry>,
    ) -> Result<Self, RelayError> {
        let mut entries = HashMap::with_capacity(raw.len());
        for entry in raw {
            let party = PartyId::new(&entry.country_code, &entry.party_id)
                .map_err(|e| RelayError::Internal(format!("registry entry: {e}")))?;
            let address = Address::from_hex(&entry.node_address)
                .map_err(|e| RelayError::Internal(format!("registry entry for {party}: {e}")))?;
            entries.insert(
                party,
                NodeOfRecord { url: entry.node_url.trim_end_matches('/').to_string(), address },
            );
        }
        Ok(Self { own_url: own_url.into().trim_end_matches('/').to_string(), entries })
    }

    pub fn from_path(own_url: impl Into<String>, path: &Path) -> Result<Self, RelayError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| RelayError::Internal(format!("registry file {}: {e}", path.display())))?;
        let entries: Vec<RegistryEntry> = serde_json::from_str(&raw)
            .map_err(|e| RelayError::Internal(format!("registry file {}: {e}", path.display())))?;
        Self::from_entries(own_url, entries)
    }

    pub fn party_count(&self) -> usize {
        self.entries.len()
    }

    fn lookup(&self, party: &PartyId) -> Result<&NodeOfRecord, RelayError> {
        self.entries
            .get(party)
            .ok_or_else(|| RelayError::UnknownReceiver { party: party.to_string() })
    }
}

#[async_trait]
impl RegistryApi for FileRegistry {
    async fn is_locally_operated(&self, party: &PartyId) -> Result<bool, RelayError> {
        Ok(self
            .entries
            .get(party)
            .map(|node| node.url == self.own_url)
            .unwrap_or(false))
    }

    async fn is_known_on_network(&self, party: &PartyId) -> Result<bool, RelayError> {
        Ok(self.entries.contains_key(party))
    }

    async fn node_base_url_of(&self, party: &PartyId) -> Result<String, RelayError> {
        Ok(self.lookup(party)?.url.clone())
    }

    async fn signing_address_of_node(&self, party: &PartyId) -> Result<Address, RelayError> {
        Ok(self.lookup(party)?.address)
    }
}
