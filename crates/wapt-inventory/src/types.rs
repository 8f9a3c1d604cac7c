//! Wire types for WAPT server responses.
//!
//! Every endpoint wraps its payload in the same envelope:
//!
//! ```json
//! { "success": true, "msg": "...", "request_time": 0.012, "result": ... }
//! ```
//!
//! The server is loose about optional fields, so missing or `null` values
//! decode to their defaults instead of failing the whole response.

use serde::{Deserialize, Deserializer, Serialize};

/// Common response wrapper shared by all WAPT endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub msg: String,
    /// Server-side processing time in seconds.
    #[serde(default, deserialize_with = "null_as_default")]
    pub request_time: f64,
    pub result: Option<T>,
}

impl<T: Default> Envelope<T> {
    /// Take the payload, treating a missing or `null` result as empty.
    pub fn into_result(self) -> T {
        self.result.unwrap_or_default()
    }
}

/// Payload of `/ping`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PingInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: String,
}

/// One managed endpoint from `/api/v3/hosts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub uuid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub host_status: String,
    /// Reachability state as reported by the server (`OK`, `UNREACHABLE`, ...).
    #[serde(default, deserialize_with = "null_as_default")]
    pub reachable: String,
    /// Version of the WAPT agent installed on the host.
    #[serde(default, deserialize_with = "null_as_default")]
    pub wapt_version: String,
}

/// One package from `/api/v3/packages`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub package: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
