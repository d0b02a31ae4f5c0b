//! Canonical party identifiers.
//!
//! A party is addressed by a 2-character country code plus a 3-character
//! party id (OCPI convention). Both components are canonicalized to ASCII
//! uppercase at construction so that routing, proxy-store keys and registry
//! lookups never depend on caller casing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::EnvelopeError;

/// A canonicalized `(country_code, party_id)` pair.
///
/// Fields are private: the only way to obtain a `PartyId` is through
/// [`PartyId::new`] or deserialization, both of which canonicalize and
/// validate. Equality and hashing therefore operate on canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPartyId")]
pub struct PartyId {
    country_code: String,
    party_id: String,
}

/// Wire shape accepted during deserialization, before canonicalization.
#[derive(Deserialize)]
struct RawPartyId {
    country_code: String,
    party_id: String,
}

impl TryFrom<RawPartyId> for PartyId {
    type Error = EnvelopeError;

    fn try_from(raw: RawPartyId) -> Result<Self, Self::Error> {
        PartyId::new(&raw.country_code, &raw.party_id)
    }
}

impl PartyId {
    /// Builds a canonical party identifier.
    ///
    /// The country code must be exactly 2 ASCII alphabetic characters and
    /// the party id exactly 3 ASCII alphanumeric characters.
    pub fn new(country_code: &str, party_id: &str) -> Result<Self, EnvelopeError> {
        let country = country_code.trim();
        let party = party_id.trim();

        if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(EnvelopeError::InvalidParty(format!(
                "country code {country:?} must be 2 ASCII letters"
            )));
        }
        if party.len() != 3 || !party.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(EnvelopeError::InvalidParty(format!(
                "party id {party:?} must be 3 ASCII alphanumerics"
            )));
        }

        Ok(Self {
            country_code: country.to_ascii_uppercase(),
            party_id: party.to_ascii_uppercase(),
        })
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    pub fn party_id(&self) -> &str {
        &self.party_id
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.country_code, self.party_id)
    }
}
