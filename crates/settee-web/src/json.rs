use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{WebError, WebResult};

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// UTC timestamp with microsecond precision and a `Z` suffix,
/// e.g. `2024-03-01T12:00:00.000000Z`.
pub fn json_format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

/// Serde adapter writing timestamps with [`json_format_datetime`].
///
/// ```
/// use chrono::{DateTime, Utc};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Event {
///     #[serde(with = "settee_web::iso_datetime")]
///     at: DateTime<Utc>,
/// }
/// ```
pub mod iso_datetime {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::json_format_datetime(dt))
    }

    /// Accepts any RFC 3339 timestamp and converts it to UTC.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(de::Error::custom)
    }
}

/// Serialize `value` into a `200 OK` response with an `application/json`
/// content type.
pub fn json_response<T: Serialize + ?Sized>(value: &T) -> WebResult<Response> {
    let body = serde_json::to_vec(value).map_err(|e| WebError::Serialization(e.to_string()))?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        body,
    )
        .into_response())
}

/// Decode every parameter value as JSON.
///
/// With `lenient`, values that are not valid JSON are kept as plain
/// strings; otherwise the first such value is an error.
pub fn json_request<I, K, V>(params: I, lenient: bool) -> WebResult<Map<String, Value>>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: AsRef<str>,
{
    let mut out = Map::new();
    for (key, raw) in params {
        let key = key.into();
        let raw = raw.as_ref();
        let value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(_) if lenient => Value::String(raw.to_string()),
            Err(e) => {
                return Err(WebError::InvalidJson {
                    key,
                    reason: e.to_string(),
                })
            }
        };
        out.insert(key, value);
    }
    Ok(out)
}
