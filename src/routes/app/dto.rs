use serde::{Deserialize, Serialize};

/// Liveness of the two external stores, under their historical wire names.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServiceStatus {
    pub redis: bool,
    pub db: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServiceStats {
    pub users: u64,
    pub files: u64,
}
