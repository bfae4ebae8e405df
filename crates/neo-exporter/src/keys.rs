use std::cmp::Ordering;
use std::fmt;

use p256::elliptic_curve::sec1::ToEncodedPoint;

use crate::error::ExporterError;
use crate::hash::ScriptHash;

const PUSHDATA1: u8 = 0x0c;
const SYSCALL: u8 = 0x41;
/// Interop ID of `System.Crypto.CheckSig`.
const CHECKSIG: [u8; 4] = [0x56, 0xe7, 0xb3, 0x27];

/// A validated secp256r1 public key, kept in compressed SEC1 form.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublicKey {
    compressed: [u8; 33],
}

impl PublicKey {
    /// Accepts compressed or uncompressed SEC1 encodings.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ExporterError> {
        let key = p256::PublicKey::from_sec1_bytes(bytes)
            .map_err(|e| ExporterError::InvalidKey(format!("{}: {e}", hex::encode(bytes))))?;
        let point = key.to_encoded_point(true);
        let compressed: [u8; 33] = point
            .as_bytes()
            .try_into()
            .map_err(|_| ExporterError::InvalidKey("unexpected compressed length".to_string()))?;
        Ok(Self { compressed })
    }

    pub fn from_hex(s: &str) -> Result<Self, ExporterError> {
        let raw = hex::decode(s.strip_prefix("0x").unwrap_or(s))
            .map_err(|e| ExporterError::InvalidKey(format!("{s}: {e}")))?;
        Self::from_bytes(&raw)
    }

    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.compressed
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.compressed)
    }

    /// Single-signature verification script for this key.
    pub fn verification_script(&self) -> Vec<u8> {
        let mut script = Vec::with_capacity(40);
        script.push(PUSHDATA1);
        script.push(self.compressed.len() as u8);
        script.extend_from_slice(&self.compressed);
        script.push(SYSCALL);
        script.extend_from_slice(&CHECKSIG);
        script
    }

    /// Account that owns balances for this key.
    pub fn script_hash(&self) -> ScriptHash {
        ScriptHash::from_script(&self.verification_script())
    }

    pub fn address(&self) -> String {
        self.script_hash().to_address()
    }
}

impl Ord for PublicKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compressed.cmp(&other.compressed)
    }
}

impl PartialOrd for PublicKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

/// Sorts keys by their compressed bytes and renders them as hex.
pub fn sorted_hex(mut keys: Vec<PublicKey>) -> Vec<String> {
    keys.sort();
    keys.iter().map(PublicKey::to_hex).collect()
}
