//! Protocol module, interface-role and method vocabulary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The OCPI 2.2 module set a node can route for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleId {
    Cdrs,
    ChargingProfiles,
    Commands,
    Credentials,
    HubClientInfo,
    Locations,
    Sessions,
    Tariffs,
    Tokens,
    Versions,
}

impl ModuleId {
    /// Lowercase identifier as it appears in URLs and version catalogs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleId::Cdrs => "cdrs",
            ModuleId::ChargingProfiles => "chargingprofiles",
            ModuleId::Commands => "commands",
            ModuleId::Credentials => "credentials",
            ModuleId::HubClientInfo => "hubclientinfo",
            ModuleId::Locations => "locations",
            ModuleId::Sessions => "sessions",
            ModuleId::Tariffs => "tariffs",
            ModuleId::Tokens => "tokens",
            ModuleId::Versions => "versions",
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cdrs" => Ok(ModuleId::Cdrs),
            "chargingprofiles" => Ok(ModuleId::ChargingProfiles),
            "commands" => Ok(ModuleId::Commands),
            "credentials" => Ok(ModuleId::Credentials),
            "hubclientinfo" => Ok(ModuleId::HubClientInfo),
            "locations" => Ok(ModuleId::Locations),
            "sessions" => Ok(ModuleId::Sessions),
            "tariffs" => Ok(ModuleId::Tariffs),
            "tokens" => Ok(ModuleId::Tokens),
            "versions" => Ok(ModuleId::Versions),
            other => Err(format!("unknown module identifier: {other}")),
        }
    }
}

/// Which side of a module interface the envelope addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InterfaceRole {
    Sender,
    Receiver,
}

impl InterfaceRole {
    /// Lowercase path segment used in module URLs.
    pub fn as_path_segment(&self) -> &'static str {
        match self {
            InterfaceRole::Sender => "sender",
            InterfaceRole::Receiver => "receiver",
        }
    }
}

impl fmt::Display for InterfaceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path_segment())
    }
}

/// HTTP method carried by the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl RequestMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Patch => "PATCH",
            RequestMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
