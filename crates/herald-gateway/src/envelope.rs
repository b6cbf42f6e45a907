// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! tRPC-compatible request and response envelopes.
//!
//! A call path is one or more comma-separated procedure names. In batch mode
//! the inputs arrive as an object keyed by call index (`"0"`, `"1"`, ...) and
//! the response is an array in the same order. Outside batch mode the input is
//! the bare value and the response a single object.

use herald_core::HeraldError;
use serde::Serialize;
use serde_json::{Map, Value, json};

/// One resolved call: procedure name plus its input, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub path: String,
    pub input: Option<Value>,
}

/// Parse raw JSON input text. Empty or absent text means no input.
pub fn parse_input(raw: Option<&str>) -> Result<Option<Value>, HeraldError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => serde_json::from_str(text)
            .map(Some)
            .map_err(|e| HeraldError::Validation(format!("input is not valid JSON: {e}"))),
    }
}

/// Split `paths` into calls, pairing each with its input.
pub fn split_calls(paths: &str, batch: bool, input: Option<Value>) -> Result<Vec<Call>, HeraldError> {
    let names: Vec<&str> = paths.split(',').collect();
    if !batch {
        if names.len() > 1 {
            return Err(HeraldError::Validation(
                "multiple procedures require batch mode".to_string(),
            ));
        }
        return Ok(vec![Call {
            path: paths.to_string(),
            input,
        }]);
    }

    let mut inputs = match input {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err(HeraldError::Validation(
                "batch input must be an object keyed by call index".to_string(),
            ));
        }
    };
    Ok(names
        .into_iter()
        .enumerate()
        .map(|(i, name)| Call {
            path: name.to_string(),
            input: inputs.remove(&i.to_string()),
        })
        .collect())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorData<'a> {
    code: &'static str,
    http_status: u16,
    path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after_seconds: Option<u64>,
}

#[derive(Debug, Serialize)]
struct ErrorShape<'a> {
    message: String,
    code: i32,
    data: ErrorData<'a>,
}

/// Encode one call outcome as a response item.
pub fn encode_result(path: &str, result: &Result<Value, HeraldError>) -> Value {
    match result {
        Ok(data) => json!({ "result": { "data": data } }),
        Err(e) => {
            let shape = ErrorShape {
                message: e.public_message(),
                code: e.json_rpc_code(),
                data: ErrorData {
                    code: e.rpc_code(),
                    http_status: e.status_code(),
                    path,
                    retry_after_seconds: e.retry_after_secs(),
                },
            };
            json!({ "error": shape })
        }
    }
}

pub fn status_of(result: &Result<Value, HeraldError>) -> u16 {
    match result {
        Ok(_) => 200,
        Err(e) => e.status_code(),
    }
}

/// Shared status when every item agrees, 207 otherwise.
pub fn batch_status(statuses: &[u16]) -> u16 {
    match statuses.split_first() {
        Some((first, rest)) if rest.iter().all(|s| s == first) => *first,
        Some(_) => 207,
        None => 200,
    }
}
