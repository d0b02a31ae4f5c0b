//! In-memory platform directory.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use subtle::ConstantTimeEq;

use ocn_types::{InterfaceRole, ModuleId, PartyId};

use crate::domain::errors::RelayError;
use crate::domain::registration::{EndpointRecord, PlatformId, PlatformRecord};
use crate::ports::PlatformDirectory;

/// Credential comparison that does not leak a match position through
/// timing. Length differences still short-circuit inside `ct_eq`, which is
/// acceptable for random tokens.
fn token_matches(candidate: &str, stored: Option<&str>) -> bool {
    match stored {
        Some(stored) => stored.as_bytes().ct_eq(candidate.as_bytes()).into(),
        None => false,
    }
}

/// `DashMap`-backed directory. All state is lost on restart; platforms
/// re-register through the credentials handshake.
#[derive(Default)]
pub struct InMemoryDirectory {
    next_id: AtomicU64,
    platforms: DashMap<PlatformId, PlatformRecord>,
    parties: DashMap<PartyId, PlatformId>,
    endpoints: DashMap<(PlatformId, ModuleId, InterfaceRole), String>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn find_platform(
        &self,
        matches: impl Fn(&PlatformRecord) -> bool,
    ) -> Option<PlatformRecord> {
        self.platforms
            .iter()
            .find(|entry| matches(entry.value()))
            .map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl PlatformDirectory for InMemoryDirectory {
    async fn platform_by_session_token(
        &self,
        token: &str,
    ) -> Result<Option<PlatformRecord>, RelayError> {
        Ok(self.find_platform(|record| token_matches(token, record.session_token.as_deref())))
    }

    async fn platform_by_setup_token(
        &self,
        token: &str,
    ) -> Result<Option<PlatformRecord>, RelayError> {
        Ok(self.find_platform(|record| token_matches(token, record.setup_token.as_deref())))
    }

    async fn platform_of_party(&self, party: &PartyId) -> Result<Option<PlatformId>, RelayError> {
        Ok(self.parties.get(party).map(|entry| *entry.value()))
    }

    async fn parties_of_platform(&self, platform: PlatformId) -> Result<Vec<PartyId>, RelayError> {
        let mut parties: Vec<PartyId> = self
            .parties
            .iter()
            .filter(|entry| *entry.value() == platform)
            .map(|entry| entry.key().clone())
            .collect();
        parties.sort_by_key(|party| party.to_string());
        Ok(parties)
    }

    async fn endpoint_for(
        &self,
        platform: PlatformId,
        module: ModuleId,
        role: InterfaceRole,
    ) -> Result<Option<String>, RelayError> {
        Ok(self
            .endpoints
            .get(&(platform, module, role))
            .map(|entry| entry.value().clone()))
    }

    async fn outbound_token_for(&self, platform: PlatformId) -> Result<Option<String>, RelayError> {
        Ok(self
            .platforms
            .get(&platform)
            .and_then(|entry| entry.value().outbound_token.clone()))
    }

    async fn create_platform(&self, setup_token: String) -> Result<PlatformRecord, RelayError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let record = PlatformRecord::planned(id, setup_token);
        self.platforms.insert(id, record.clone());
        Ok(record)
    }

    async fn update_platform(&self, record: PlatformRecord) -> Result<(), RelayError> {
        self.platforms.insert(record.id, record);
        Ok(())
    }

    async fn set_parties(
        &self,
        platform: PlatformId,
        parties: Vec<PartyId>,
    ) -> Result<(), RelayError> {
        self.parties.retain(|_, assigned| *assigned != platform);
        for party in parties {
            self.parties.insert(party, platform);
        }
        Ok(())
    }

    async fn set_endpoints(
        &self,
        platform: PlatformId,
        endpoints: Vec<EndpointRecord>,
    ) -> Result<(), RelayError> {
        self.endpoints.retain(|(owner, _, _), _| *owner != platform);
        for endpoint in endpoints {
            self.endpoints
                .insert((platform, endpoint.module, endpoint.role), endpoint.url);
        }
        Ok(())
    }

    async fn remove_platform(&self, platform: PlatformId) -> Result<(), RelayError> {
        self.platforms.remove(&platform);
        self.parties.retain(|_, assigned| *assigned != platform);
        self.endpoints.retain(|(owner, _, _), _| *owner != platform);
        Ok(())
    }
}
