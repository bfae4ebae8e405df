use std::fmt;
use std::str::FromStr;

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::constants::ADDRESS_VERSION;
use crate::error::ExporterError;

/// 160-bit contract or account identifier.
///
/// Bytes are kept in the little-endian order used inside scripts and
/// addresses; `Display` renders the conventional big-endian hex form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ScriptHash([u8; 20]);

impl ScriptHash {
    pub const fn new(le_bytes: [u8; 20]) -> Self {
        Self(le_bytes)
    }

    /// Decodes a 40-character big-endian hex literal at compile time.
    pub const fn from_display_hex(s: &str) -> Self {
        const fn nibble(c: u8) -> u8 {
            match c {
                b'0'..=b'9' => c - b'0',
                b'a'..=b'f' => c - b'a' + 10,
                b'A'..=b'F' => c - b'A' + 10,
                _ => panic!("invalid hex digit"),
            }
        }
        let raw = s.as_bytes();
        assert!(raw.len() == 40, "script hash literal must be 40 hex digits");
        let mut out = [0u8; 20];
        let mut i = 0;
        while i < 20 {
            out[19 - i] = (nibble(raw[2 * i]) << 4) | nibble(raw[2 * i + 1]);
            i += 1;
        }
        Self(out)
    }

    /// Hash of a verification (or any other) script.
    pub fn from_script(script: &[u8]) -> Self {
        let sha = Sha256::digest(script);
        let rip = Ripemd160::digest(sha);
        let mut out = [0u8; 20];
        out.copy_from_slice(&rip);
        Self(out)
    }

    /// Parses a big-endian hex string, with or without `0x`.
    pub fn from_hex(s: &str) -> Result<Self, ExporterError> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = hex::decode(trimmed)
            .map_err(|e| ExporterError::InvalidHash(format!("{s}: {e}")))?;
        if bytes.len() != 20 {
            return Err(ExporterError::InvalidHash(format!(
                "{s}: expected 20 bytes, got {}",
                bytes.len()
            )));
        }
        bytes.reverse();
        Self::from_le_slice(&bytes)
    }

    /// Parses bare hex written in little-endian byte order, the form used for
    /// hashes in configuration files and NNS records.
    pub fn from_le_hex(s: &str) -> Result<Self, ExporterError> {
        let bytes =
            hex::decode(s).map_err(|e| ExporterError::InvalidHash(format!("{s}: {e}")))?;
        Self::from_le_slice(&bytes)
    }

    /// Builds a hash from its little-endian byte form as found on the VM stack.
    pub fn from_le_slice(bytes: &[u8]) -> Result<Self, ExporterError> {
        let arr: [u8; 20] = bytes.try_into().map_err(|_| {
            ExporterError::InvalidHash(format!("expected 20 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }

    /// Decodes a base58check N3 address.
    pub fn from_address(address: &str) -> Result<Self, ExporterError> {
        let raw = bs58::decode(address)
            .into_vec()
            .map_err(|e| ExporterError::InvalidHash(format!("{address}: {e}")))?;
        if raw.len() != 25 {
            return Err(ExporterError::InvalidHash(format!(
                "{address}: wrong address length"
            )));
        }
        let (payload, checksum) = raw.split_at(21);
        if checksum != &double_sha256(payload)[..4] {
            return Err(ExporterError::InvalidHash(format!(
                "{address}: checksum mismatch"
            )));
        }
        if payload[0] != ADDRESS_VERSION {
            return Err(ExporterError::InvalidHash(format!(
                "{address}: unexpected version {:#04x}",
                payload[0]
            )));
        }
        Self::from_le_slice(&payload[1..])
    }

    /// Encodes the hash as a base58check N3 address.
    pub fn to_address(&self) -> String {
        let mut payload = Vec::with_capacity(25);
        payload.push(ADDRESS_VERSION);
        payload.extend_from_slice(&self.0);
        let checksum = double_sha256(&payload);
        payload.extend_from_slice(&checksum[..4]);
        bs58::encode(payload).into_string()
    }

    pub fn as_le_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Big-endian hex without prefix.
    pub fn to_hex(&self) -> String {
        let mut be = self.0;
        be.reverse();
        hex::encode(be)
    }

    /// Little-endian hex without prefix; inverse of [`ScriptHash::from_le_hex`].
    pub fn to_le_hex(&self) -> String {
        hex::encode(self.0)
    }
}

fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

impl fmt::Display for ScriptHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ScriptHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScriptHash(0x{})", self.to_hex())
    }
}

impl FromStr for ScriptHash {
    type Err = ExporterError;

    /// Accepts `0x`-prefixed big-endian hex, bare little-endian hex or an
    /// address.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("0x") {
            return Self::from_hex(s);
        }
        Self::from_le_hex(s).or_else(|_| Self::from_address(s))
    }
}
