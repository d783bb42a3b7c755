//! View rows and key collation.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use settee_types::DocId;

/// One row of a view result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewRow {
    pub id: Option<DocId>,
    pub key: Value,
    pub value: Value,
    /// The emitting document, present when queried with `include_docs`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<Value>,
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(false) => 1,
        Value::Bool(true) => 2,
        Value::Number(_) => 3,
        Value::String(_) => 4,
        Value::Array(_) => 5,
        Value::Object(_) => 6,
    }
}

/// Order two view keys: null < false < true < numbers < strings < arrays < objects.
///
/// Strings compare by code point, arrays and objects element-wise.
pub fn collate(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (l, r) in x.iter().zip(y.iter()) {
                let ord = collate(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(x), Value::Object(y)) => {
            for ((lk, lv), (rk, rv)) in x.iter().zip(y.iter()) {
                let ord = lk.cmp(rk).then_with(|| collate(lv, rv));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Filter, order and page rows according to view query parameters.
///
/// Supported parameters: `key`, `startkey`, `endkey` (inclusive),
/// `descending`, `skip`, `limit`. Unknown parameters are ignored.
pub(crate) fn apply_params(mut rows: Vec<ViewRow>, params: &Value) -> Vec<ViewRow> {
    let descending = params
        .get("descending")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    rows.sort_by(|a, b| {
        collate(&a.key, &b.key).then_with(|| a.id.cmp(&b.id))
    });
    if descending {
        rows.reverse();
    }

    if let Some(key) = params.get("key") {
        rows.retain(|r| collate(&r.key, key) == Ordering::Equal);
    }
    // With descending order the start key is the upper bound.
    let (lower, upper) = if descending {
        (params.get("endkey"), params.get("startkey"))
    } else {
        (params.get("startkey"), params.get("endkey"))
    };
    if let Some(lower) = lower {
        rows.retain(|r| collate(&r.key, lower) != Ordering::Less);
    }
    if let Some(upper) = upper {
        rows.retain(|r| collate(&r.key, upper) != Ordering::Greater);
    }

    let skip = params.get("skip").and_then(Value::as_u64).unwrap_or(0) as usize;
    let limit = params
        .get("limit")
        .and_then(Value::as_u64)
        .map(|l| l as usize)
        .unwrap_or(usize::MAX);
    rows.into_iter().skip(skip).take(limit).collect()
}
