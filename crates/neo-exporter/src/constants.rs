use std::time::Duration;

use crate::hash::ScriptHash;

/// Native GAS token contract.
pub const GAS_CONTRACT: ScriptHash =
    ScriptHash::from_display_hex("d2a4cff31913016155e38e474a2c06d08be276cf");

/// Native NEO token contract.
pub const NEO_CONTRACT: ScriptHash =
    ScriptHash::from_display_hex("ef4073a0f2b305a38ec4050e4d3d28bc40ea63f5");

/// Native Notary contract. Only deployed on notary-enabled chains.
pub const NOTARY_CONTRACT: ScriptHash =
    ScriptHash::from_display_hex("c1e14f19c3e60d0b9244d06dd7ba9b113135ec3b");

/// Native RoleManagement contract.
pub const ROLE_MANAGEMENT_CONTRACT: ScriptHash =
    ScriptHash::from_display_hex("49cf4e5378ffcd4dec034fd98a174c5491e395e2");

/// Name of the native Notary contract as reported by `getnativecontracts`.
pub const NOTARY_NATIVE_NAME: &str = "Notary";

/// `NeoFSAlphabet` node role in RoleManagement.
pub const ROLE_NEOFS_ALPHABET: i64 = 16;

/// The NNS contract is always deployed first on the side chain.
pub const NNS_CONTRACT_ID: i32 = 1;

/// NNS `TXT` record type.
pub const NNS_TXT_RECORD: i64 = 16;

/// Zone under which NeoFS system contracts are registered in NNS.
pub const NNS_FS_ZONE: &str = "neofs";

/// Address version byte of N3 addresses.
pub const ADDRESS_VERSION: u8 = 0x35;

/// Notary deposits are denominated in GAS.
pub const NOTARY_DECIMALS: u32 = 8;

/// Default interval for which a successful liveness probe is trusted.
pub const DEFAULT_RECHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Number of items requested per `traverseiterator` call.
pub const ITERATOR_PAGE_SIZE: u32 = 100;

/// Node attribute carrying the UN/LOCODE of the node.
pub const ATTR_LOCODE: &str = "UN-LOCODE";

/// Node attribute carrying the declared capacity in GB.
pub const ATTR_CAPACITY: &str = "Capacity";
