use alloy::primitives::{I256, U256};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ExporterError;
use crate::hash::ScriptHash;
use crate::keys::PublicKey;

/// A VM stack item as returned by invocation and iterator calls.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawStackItem")]
pub enum StackItem {
    Any,
    Pointer(i64),
    Boolean(bool),
    Integer(I256),
    ByteString(Vec<u8>),
    Buffer(Vec<u8>),
    Array(Vec<StackItem>),
    Struct(Vec<StackItem>),
    Map(Vec<(StackItem, StackItem)>),
    InteropInterface { id: Option<String> },
}

#[derive(Deserialize)]
struct RawStackItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    id: Option<String>,
}

#[derive(Deserialize)]
struct RawMapEntry {
    key: StackItem,
    value: StackItem,
}

impl TryFrom<RawStackItem> for StackItem {
    type Error = String;

    fn try_from(raw: RawStackItem) -> Result<Self, Self::Error> {
        let value = raw.value.unwrap_or(Value::Null);
        let item = match raw.kind.as_str() {
            "Any" => StackItem::Any,
            "Pointer" => StackItem::Pointer(
                value
                    .as_i64()
                    .ok_or_else(|| format!("bad pointer value: {value}"))?,
            ),
            "Boolean" => StackItem::Boolean(
                value
                    .as_bool()
                    .ok_or_else(|| format!("bad boolean value: {value}"))?,
            ),
            "Integer" => {
                let s = match &value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    other => return Err(format!("bad integer value: {other}")),
                };
                StackItem::Integer(
                    I256::from_dec_str(&s).map_err(|e| format!("bad integer {s}: {e}"))?,
                )
            }
            "ByteString" => StackItem::ByteString(decode_b64(&value)?),
            "Buffer" => StackItem::Buffer(decode_b64(&value)?),
            "Array" => StackItem::Array(decode_list(value)?),
            "Struct" => StackItem::Struct(decode_list(value)?),
            "Map" => {
                let entries: Vec<RawMapEntry> =
                    serde_json::from_value(value).map_err(|e| format!("bad map: {e}"))?;
                StackItem::Map(entries.into_iter().map(|e| (e.key, e.value)).collect())
            }
            "InteropInterface" => StackItem::InteropInterface { id: raw.id },
            other => return Err(format!("unknown stack item type {other}")),
        };
        Ok(item)
    }
}

fn decode_b64(value: &Value) -> Result<Vec<u8>, String> {
    match value {
        Value::String(s) => STANDARD
            .decode(s)
            .map_err(|e| format!("bad base64 {s}: {e}")),
        Value::Null => Ok(Vec::new()),
        other => Err(format!("bad byte string value: {other}")),
    }
}

fn decode_list(value: Value) -> Result<Vec<StackItem>, String> {
    serde_json::from_value(value).map_err(|e| format!("bad item list: {e}"))
}

impl StackItem {
    pub fn kind(&self) -> &'static str {
        match self {
            StackItem::Any => "Any",
            StackItem::Pointer(_) => "Pointer",
            StackItem::Boolean(_) => "Boolean",
            StackItem::Integer(_) => "Integer",
            StackItem::ByteString(_) => "ByteString",
            StackItem::Buffer(_) => "Buffer",
            StackItem::Array(_) => "Array",
            StackItem::Struct(_) => "Struct",
            StackItem::Map(_) => "Map",
            StackItem::InteropInterface { .. } => "InteropInterface",
        }
    }

    /// Integer view with VM conversion rules for booleans and byte strings.
    pub fn try_integer(&self) -> Result<I256, ExporterError> {
        match self {
            StackItem::Integer(v) => Ok(*v),
            StackItem::Boolean(b) => Ok(if *b { I256::ONE } else { I256::ZERO }),
            StackItem::ByteString(b) | StackItem::Buffer(b) => le_bytes_to_int(b),
            other => Err(ExporterError::stack(format!(
                "expected integer, got {}",
                other.kind()
            ))),
        }
    }

    pub fn try_i64(&self) -> Result<i64, ExporterError> {
        let v = self.try_integer()?;
        i64::try_from(v).map_err(|_| ExporterError::stack(format!("integer {v} overflows i64")))
    }

    pub fn try_bool(&self) -> Result<bool, ExporterError> {
        match self {
            StackItem::Boolean(b) => Ok(*b),
            StackItem::Integer(v) => Ok(!v.is_zero()),
            StackItem::ByteString(b) | StackItem::Buffer(b) => Ok(b.iter().any(|x| *x != 0)),
            other => Err(ExporterError::stack(format!(
                "expected boolean, got {}",
                other.kind()
            ))),
        }
    }

    pub fn try_bytes(&self) -> Result<&[u8], ExporterError> {
        match self {
            StackItem::ByteString(b) | StackItem::Buffer(b) => Ok(b),
            other => Err(ExporterError::stack(format!(
                "expected byte string, got {}",
                other.kind()
            ))),
        }
    }

    /// UTF-8 view of a byte string item.
    pub fn try_utf8(&self) -> Result<String, ExporterError> {
        let bytes = self.try_bytes()?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| ExporterError::stack(format!("invalid utf-8 string: {e}")))
    }

    /// Elements of an array or struct item.
    pub fn try_array(&self) -> Result<&[StackItem], ExporterError> {
        match self {
            StackItem::Array(items) | StackItem::Struct(items) => Ok(items),
            other => Err(ExporterError::stack(format!(
                "expected array, got {}",
                other.kind()
            ))),
        }
    }

    pub fn iterator_id(&self) -> Result<&str, ExporterError> {
        match self {
            StackItem::InteropInterface { id: Some(id) } => Ok(id),
            other => Err(ExporterError::stack(format!(
                "expected iterator, got {}",
                other.kind()
            ))),
        }
    }
}

fn le_bytes_to_int(bytes: &[u8]) -> Result<I256, ExporterError> {
    if bytes.len() > 32 {
        return Err(ExporterError::stack(format!(
            "integer of {} bytes is too big",
            bytes.len()
        )));
    }
    if bytes.is_empty() {
        return Ok(I256::ZERO);
    }
    let negative = bytes[bytes.len() - 1] & 0x80 != 0;
    let mut buf = if negative { [0xffu8; 32] } else { [0u8; 32] };
    buf[..bytes.len()].copy_from_slice(bytes);
    Ok(I256::from_raw(U256::from_le_bytes(buf)))
}

/// Typed invocation parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "Value")]
pub enum ContractParam {
    Integer(i64),
    String(String),
    Hash160(ScriptHash),
    PublicKey(PublicKey),
    ByteArray(Vec<u8>),
}

impl From<ContractParam> for Value {
    fn from(param: ContractParam) -> Self {
        match param {
            ContractParam::Integer(v) => json!({ "type": "Integer", "value": v.to_string() }),
            ContractParam::String(s) => json!({ "type": "String", "value": s }),
            ContractParam::Hash160(h) => json!({ "type": "Hash160", "value": format!("0x{h}") }),
            ContractParam::PublicKey(k) => json!({ "type": "PublicKey", "value": k.to_hex() }),
            ContractParam::ByteArray(b) => {
                json!({ "type": "ByteArray", "value": STANDARD.encode(b) })
            }
        }
    }
}
