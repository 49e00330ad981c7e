//! Response normalization.
//!
//! The backend answers in several shapes: bare objects and arrays, or the
//! same wrapped in a `{ data, message, success }` envelope. Everything that
//! leaves the client goes through this module so the rest of the crate only
//! sees one shape per record type.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use floodwatch_shared::{
    AlertSettings, AuthGrant, ClosedRoad, EvacuationCenter, FloodData, UploadedObject, UserProfile,
};

const UNEXPECTED_FORMAT: &str = "Server returned data in an unexpected format";

/// Strips one level of `{ "data": ... }` envelope if present. A `null`
/// payload stays `null` so callers reject it.
pub fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Decodes a single record, bare or wrapped.
pub fn object<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
    let inner = unwrap_envelope(value);
    if !inner.is_object() {
        return Err(ApiError::decode(UNEXPECTED_FORMAT));
    }
    serde_json::from_value(inner)
        .map_err(|e| ApiError::decode(format!("{}: {}", UNEXPECTED_FORMAT, e)).with_source(e))
}

/// Decodes a list, accepting a bare array or an array under `data`.
pub fn list<T: DeserializeOwned>(value: Value) -> ApiResult<Vec<T>> {
    let items = match unwrap_envelope(value) {
        Value::Array(items) => items,
        _ => return Err(ApiError::decode(UNEXPECTED_FORMAT)),
    };
    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item).map_err(|e| {
                ApiError::decode(format!("{}: {}", UNEXPECTED_FORMAT, e)).with_source(e)
            })
        })
        .collect()
}

/// Extracts token and user from a login reply.
///
/// Each is looked up at the top level first, then under `data`. A user that
/// does not decode is treated as absent.
pub fn auth_grant(value: Value) -> AuthGrant {
    let nested = value.get("data").filter(|d| d.is_object());

    let token = lookup(&value, nested, "token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    let user = lookup(&value, nested, "user")
        .filter(|u| u.is_object())
        .and_then(|u| serde_json::from_value::<UserProfile>(u.clone()).ok());

    AuthGrant { token, user }
}

fn lookup<'a>(top: &'a Value, nested: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    top.get(key)
        .filter(|v| !v.is_null())
        .or_else(|| nested.and_then(|n| n.get(key)).filter(|v| !v.is_null()))
}

/// Human-readable message from an error body: `message`, then `error`.
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"].iter().find_map(|key| {
        value
            .get(*key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

// =========================================================
// Typed decoding
// =========================================================

/// Conversion from a parsed response body into a typed result.
pub trait FromPayload: Sized {
    fn from_payload(value: Value) -> ApiResult<Self>;
}

impl<T: DeserializeOwned> FromPayload for Vec<T> {
    fn from_payload(value: Value) -> ApiResult<Self> {
        list(value)
    }
}

/// Acknowledgement only; the body is ignored.
impl FromPayload for () {
    fn from_payload(_value: Value) -> ApiResult<Self> {
        Ok(())
    }
}

impl FromPayload for Value {
    fn from_payload(value: Value) -> ApiResult<Self> {
        Ok(value)
    }
}

impl FromPayload for AuthGrant {
    fn from_payload(value: Value) -> ApiResult<Self> {
        Ok(auth_grant(value))
    }
}

macro_rules! object_payload {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromPayload for $ty {
                fn from_payload(value: Value) -> ApiResult<Self> {
                    object(value)
                }
            }
        )*
    };
}

object_payload!(
    UserProfile,
    FloodData,
    AlertSettings,
    EvacuationCenter,
    ClosedRoad,
    UploadedObject,
);
