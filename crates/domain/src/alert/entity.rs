use serde::{Deserialize, Deserializer, Serialize};

/// Opaque alert identifier, stable across snapshot and stream delivery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertId(pub String);

impl std::fmt::Display for AlertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Alert category as reported by the tracking backend.
///
/// The wire set is open: values this build does not know about map to
/// `Other` and are carried through verbatim rather than rejected, so an
/// older client keeps working against a newer backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlertCategory {
    /// Asset crossed a zone boundary it must not leave.
    BoundaryBreach,
    /// Asset is close to a zone boundary.
    NearBoundary,
    /// Asset seen in a zone it does not belong to.
    Misplaced,
    /// Tag battery below threshold.
    LowBattery,
    /// Unrecognized category, preserved as received.
    Other(String),
}

impl AlertCategory {
    pub fn as_str(&self) -> &str {
        match self {
            Self::BoundaryBreach => "boundary-breach",
            Self::NearBoundary => "near-boundary",
            Self::Misplaced => "misplaced",
            Self::LowBattery => "low-battery",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for AlertCategory {
    fn from(s: String) -> Self {
        match s.as_str() {
            "boundary-breach" => Self::BoundaryBreach,
            "near-boundary" => Self::NearBoundary,
            "misplaced" => Self::Misplaced,
            "low-battery" => Self::LowBattery,
            _ => Self::Other(s),
        }
    }
}

impl From<AlertCategory> for String {
    fn from(c: AlertCategory) -> Self {
        c.as_str().to_string()
    }
}

impl std::fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single alert as held in the feed.
///
/// Both the snapshot endpoint and the push stream deliver this shape.
/// The backend emits `timestamp` either as raw epoch milliseconds or as a
/// wrapped object `{"$date": <millis>}`; both normalize to `timestamp_ms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: AlertId,
    pub category: AlertCategory,
    #[serde(rename = "assetId")]
    pub asset_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "timestamp", deserialize_with = "deserialize_timestamp")]
    pub timestamp_ms: i64,
    #[serde(rename = "isRead", default)]
    pub is_read: bool,
}

impl AlertRecord {
    /// Human-readable description: the backend-provided text when present,
    /// otherwise a deterministic derivation from category and asset.
    pub fn describe(&self) -> String {
        match &self.description {
            Some(text) => text.clone(),
            None => match &self.category {
                AlertCategory::BoundaryBreach => {
                    format!("Asset {} left its allowed zone", self.asset_id)
                }
                AlertCategory::NearBoundary => {
                    format!("Asset {} is near a zone boundary", self.asset_id)
                }
                AlertCategory::Misplaced => {
                    format!("Asset {} is in the wrong zone", self.asset_id)
                }
                AlertCategory::LowBattery => {
                    format!("Asset {} tag battery is low", self.asset_id)
                }
                AlertCategory::Other(kind) => {
                    format!("Alert ({kind}) for asset {}", self.asset_id)
                }
            },
        }
    }
}

/// Timestamp on the wire: raw epoch milliseconds or `{"$date": <millis>}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireTimestamp {
    Millis(i64),
    Wrapped {
        #[serde(rename = "$date")]
        date: i64,
    },
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match WireTimestamp::deserialize(deserializer)? {
        WireTimestamp::Millis(ms) | WireTimestamp::Wrapped { date: ms } => Ok(ms),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> AlertRecord {
        serde_json::from_str(json).expect("valid alert json")
    }

    #[test]
    fn record_from_raw_timestamp() {
        let rec = parse(
            r#"{"id":"a1","category":"boundary-breach","assetId":"bed-7","timestamp":1700000000000}"#,
        );
        assert_eq!(rec.id.0, "a1");
        assert_eq!(rec.category, AlertCategory::BoundaryBreach);
        assert_eq!(rec.timestamp_ms, 1_700_000_000_000);
        assert!(!rec.is_read);
    }

    #[test]
    fn record_from_wrapped_timestamp() {
        let rec = parse(
            r#"{"id":"a2","category":"misplaced","assetId":"pump-3","timestamp":{"$date":1700000000000}}"#,
        );
        assert_eq!(rec.timestamp_ms, 1_700_000_000_000);
    }

    #[test]
    fn both_timestamp_shapes_normalize_to_same_instant() {
        let raw = parse(r#"{"id":"x","category":"misplaced","assetId":"a","timestamp":42}"#);
        let wrapped =
            parse(r#"{"id":"x","category":"misplaced","assetId":"a","timestamp":{"$date":42}}"#);
        assert_eq!(raw.timestamp_ms, wrapped.timestamp_ms);
    }

    #[test]
    fn unknown_category_is_preserved_not_rejected() {
        let rec = parse(
            r#"{"id":"a3","category":"tag-tamper","assetId":"cart-9","timestamp":1,"isRead":true}"#,
        );
        assert_eq!(rec.category, AlertCategory::Other("tag-tamper".to_string()));
        assert_eq!(rec.category.as_str(), "tag-tamper");
        assert!(rec.is_read);
    }

    #[test]
    fn category_roundtrip() {
        for c in [
            AlertCategory::BoundaryBreach,
            AlertCategory::NearBoundary,
            AlertCategory::Misplaced,
            AlertCategory::LowBattery,
            AlertCategory::Other("custom".to_string()),
        ] {
            assert_eq!(AlertCategory::from(String::from(c.clone())), c);
        }
    }

    #[test]
    fn describe_prefers_backend_text() {
        let mut rec = parse(r#"{"id":"a","category":"misplaced","assetId":"ivp-1","timestamp":1}"#);
        rec.description = Some("IV pump left ward 3".to_string());
        assert_eq!(rec.describe(), "IV pump left ward 3");
    }

    #[test]
    fn describe_fallback_is_deterministic_per_category() {
        let rec = parse(r#"{"id":"a","category":"near-boundary","assetId":"ivp-1","timestamp":1}"#);
        assert_eq!(rec.describe(), "Asset ivp-1 is near a zone boundary");

        let rec = parse(r#"{"id":"a","category":"weird","assetId":"ivp-1","timestamp":1}"#);
        assert_eq!(rec.describe(), "Alert (weird) for asset ivp-1");
    }

    #[test]
    fn missing_is_read_defaults_to_unread() {
        let rec = parse(r#"{"id":"a","category":"misplaced","assetId":"x","timestamp":1}"#);
        assert!(!rec.is_read);
    }
}
