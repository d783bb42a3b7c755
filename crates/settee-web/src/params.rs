use serde_json::{Map, Value};

use crate::error::{WebError, WebResult};

/// Parse a decimal integer, tolerating surrounding whitespace.
pub fn parse_int(key: &str, raw: &str) -> WebResult<i64> {
    raw.trim().parse().map_err(|_| WebError::InvalidInt {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

/// Replace the named parameters with their integer values in place.
///
/// Strings are parsed, integers are kept, and anything else (or a missing
/// key) is an error. `params` is left unchanged on error.
pub fn coerce_ints(params: &mut Map<String, Value>, keys: &[&str]) -> WebResult<()> {
    let mut parsed = Vec::with_capacity(keys.len());
    for &key in keys {
        let value = params
            .get(key)
            .ok_or_else(|| WebError::MissingParam(key.to_string()))?;
        let n = match value {
            Value::String(s) => parse_int(key, s)?,
            Value::Number(n) => n.as_i64().ok_or_else(|| WebError::InvalidInt {
                key: key.to_string(),
                value: n.to_string(),
            })?,
            other => {
                return Err(WebError::InvalidInt {
                    key: key.to_string(),
                    value: other.to_string(),
                })
            }
        };
        parsed.push((key, n));
    }
    for (key, n) in parsed {
        params.insert(key.to_string(), Value::from(n));
    }
    Ok(())
}
