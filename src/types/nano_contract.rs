// Nano contract registration records

use serde::{Deserialize, Serialize};

/// A nano contract instance registered with this wallet
///
/// Created on explicit registration, removed on unregistration; only the
/// registered address may change afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NanoContractData {
    /// Contract instance id
    pub nc_id: String,
    /// Blueprint the instance was created from
    pub blueprint_id: String,
    /// Wallet address annotated on the registration
    pub address: String,
}
