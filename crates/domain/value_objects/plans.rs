use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::entities::plans::PlanEntity;

pub const UNLIMITED: &str = "unlimited";
pub const LISTINGS_KEY: &str = "listings";
pub const FEATURED_KEY: &str = "featured";

/// A plan limit. `Unlimited` is a separate variant, never a numeric sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quota {
    Limited(i64),
    Unlimited,
}

impl Quota {
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Quota::Unlimited)
    }

    pub fn limit(&self) -> Option<i64> {
        match self {
            Quota::Limited(limit) => Some(*limit),
            Quota::Unlimited => None,
        }
    }

    /// True once `current` usage leaves no room for one more item.
    pub fn is_reached_by(&self, current: i64) -> bool {
        match self {
            Quota::Limited(limit) => current >= *limit,
            Quota::Unlimited => false,
        }
    }
}

impl Default for Quota {
    fn default() -> Self {
        Quota::Limited(0)
    }
}

/// Serialized as a number, or `null` for unlimited.
impl Serialize for Quota {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Quota::Limited(limit) => serializer.serialize_i64(*limit),
            Quota::Unlimited => serializer.serialize_none(),
        }
    }
}

/// Plan features as they come out of storage: either a JSON document or a JSON-encoded string.
#[derive(Debug, Clone, PartialEq)]
pub enum FeaturesRaw {
    Json(String),
    Structured(Map<String, Value>),
}

impl FeaturesRaw {
    /// Maps a stored column value onto the raw representation. Anything that is neither an
    /// object nor a string is treated as missing.
    pub fn from_column(value: Option<Value>) -> Option<Self> {
        match value? {
            Value::String(encoded) => Some(FeaturesRaw::Json(encoded)),
            Value::Object(map) => Some(FeaturesRaw::Structured(map)),
            Value::Null => None,
            other => {
                warn!(
                    kind = json_kind(&other),
                    "plans: unsupported features value, treating as empty"
                );
                None
            }
        }
    }
}

/// Typed quotas resolved once when a plan is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlanFeatures {
    pub listings: Quota,
    pub featured: Quota,
}

impl PlanFeatures {
    pub fn parse(raw: Option<&FeaturesRaw>) -> Self {
        let map = match raw {
            None => return Self::default(),
            Some(FeaturesRaw::Structured(map)) => map.clone(),
            Some(FeaturesRaw::Json(encoded)) => match serde_json::from_str::<Value>(encoded) {
                Ok(Value::Object(map)) => map,
                Ok(other) => {
                    warn!(
                        kind = json_kind(&other),
                        "plans: features JSON is not an object, granting zero quota"
                    );
                    return Self::default();
                }
                Err(err) => {
                    warn!(
                        error = %err,
                        "plans: failed to decode features JSON, granting zero quota"
                    );
                    return Self::default();
                }
            },
        };

        Self {
            listings: quota_from_value(map.get(LISTINGS_KEY)),
            featured: quota_from_value(map.get(FEATURED_KEY)),
        }
    }
}

pub fn listing_quota(plan: Option<&PlanEntity>) -> Quota {
    plan.map(|plan| plan.features.listings).unwrap_or_default()
}

pub fn featured_quota(plan: Option<&PlanEntity>) -> Quota {
    plan.map(|plan| plan.features.featured).unwrap_or_default()
}

/// Numbers and numeric strings become limits, "unlimited" lifts the limit, and anything
/// else grants nothing.
fn quota_from_value(value: Option<&Value>) -> Quota {
    let limit = match value {
        None | Some(Value::Null) => 0,
        Some(Value::String(raw)) => {
            let raw = raw.trim();
            if raw == UNLIMITED {
                return Quota::Unlimited;
            }
            raw.parse::<i64>()
                .ok()
                .or_else(|| raw.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v.trunc() as i64))
                .unwrap_or(0)
        }
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|v| v.is_finite()).map(|v| v.trunc() as i64))
            .unwrap_or(0),
        Some(_) => 0,
    };

    Quota::Limited(limit.max(0))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
