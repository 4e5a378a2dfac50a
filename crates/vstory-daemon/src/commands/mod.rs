//! IPC command handlers.
//!
//! Each submodule implements the commands for one IPC category. Handlers
//! validate and convert params at the boundary, so ledger functions only
//! ever see typed values: amounts must be JSON unsigned integers and enum
//! labels must parse.

pub mod admin;
pub mod catalog;
pub mod diagnostics;
pub mod quests;
pub mod revenue;
pub mod wallet;

use std::str::FromStr;

use serde_json::Value;

use crate::rpc::RpcError;

pub(crate) type Result = std::result::Result<Value, RpcError>;

/// Outcome of reading one param.
pub(crate) type Param<T> = std::result::Result<T, RpcError>;

/// Default page size for list commands.
pub(crate) const DEFAULT_LIMIT: u32 = 50;

/// A required, non-empty string param.
pub(crate) fn required_str(params: &Value, key: &str) -> Param<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| RpcError::invalid_params(&format!("{key} required")))
}

/// An optional string param. Present but not a string is an error.
pub(crate) fn optional_str(params: &Value, key: &str) -> Param<Option<String>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(RpcError::invalid_params(&format!("{key} must be a string"))),
    }
}

/// A required coin amount: a JSON unsigned integer.
pub(crate) fn required_amount(params: &Value, key: &str) -> Param<u64> {
    params
        .get(key)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| RpcError::invalid_params(&format!("{key} must be a non-negative integer")))
}

/// A required signed integer (balance adjustments).
pub(crate) fn required_i64(params: &Value, key: &str) -> Param<i64> {
    params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| RpcError::invalid_params(&format!("{key} must be an integer")))
}

/// An optional unsigned integer param that fits in `u32`.
pub(crate) fn optional_u32(params: &Value, key: &str) -> Param<Option<u32>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| {
                RpcError::invalid_params(&format!("{key} must be a small non-negative integer"))
            }),
    }
}

/// An optional unsigned integer param (timestamps).
pub(crate) fn optional_u64(params: &Value, key: &str) -> Param<Option<u64>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| {
                RpcError::invalid_params(&format!("{key} must be a non-negative integer"))
            }),
    }
}

/// An optional boolean param.
pub(crate) fn optional_bool(params: &Value, key: &str) -> Param<Option<bool>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(RpcError::invalid_params(&format!("{key} must be a boolean"))),
    }
}

/// A required param holding one of a closed set of labels.
pub(crate) fn required_label<T>(params: &Value, key: &str) -> Param<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = required_str(params, key)?;
    raw.parse()
        .map_err(|e: T::Err| RpcError::invalid_params(&e.to_string()))
}

/// An optional label param.
pub(crate) fn optional_label<T>(params: &Value, key: &str) -> Param<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_str(params, key)? {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e: T::Err| RpcError::invalid_params(&e.to_string())),
    }
}

/// Serialize a handler result.
pub(crate) fn to_value<T: serde::Serialize>(value: &T) -> Result {
    serde_json::to_value(value).map_err(|e| RpcError::internal_error(&format!("serialize: {e}")))
}
