//! Canonical error-log record
//!
//! Every nesting level of the crash event is optional. Decoding is lenient:
//! a nested value of the wrong JSON type is treated as absent rather than
//! failing the record, and empty strings count as absent. Accessors return
//! `None` when any level on the path is missing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use smallvec::SmallVec;

/// Brand lists are ordered; index 0 is the primary browser.
pub type BrandList = SmallVec<[Brand; 4]>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    #[serde(default, deserialize_with = "lenient_string")]
    pub brand: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAgent {
    #[serde(default, deserialize_with = "lenient_brands")]
    pub brands: BrandList,
    #[serde(default, deserialize_with = "lenient")]
    pub mobile: Option<bool>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub platform: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub platform_version: Option<String>,
}

/// Wall-clock time reported by the game client when the error happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorTime {
    pub day: u32,
    pub month: u32,
    pub year: i32,
    pub hour: u32,
    pub min: u32,
    pub sec: u32,
}

impl ErrorTime {
    /// `None` when the reported fields do not form a valid calendar time
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)?
            .and_hms_opt(self.hour, self.min, self.sec)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    #[serde(default, deserialize_with = "lenient")]
    pub error_time: Option<ErrorTime>,
    #[serde(default, deserialize_with = "lenient")]
    pub initial_width: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub initial_height: Option<u32>,
}

/// One error event, independent of the export format it arrived in
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecord {
    pub timestamp: DateTime<Utc>,
    pub error_message: Option<String>,
    pub game_name: Option<String>,
    pub game_id: Option<String>,
    pub error_type: Option<String>,
    pub silent_error: Option<bool>,
    pub user_agent: Option<UserAgent>,
    pub session_info: Option<SessionInfo>,
    /// Event object as received, kept for the details view
    #[serde(skip)]
    pub raw: Value,
}

/// Categorical fields a record can be grouped by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CategoryField {
    #[default]
    ErrorMessage,
    ErrorType,
    GameName,
    GameId,
    Platform,
    PrimaryBrowser,
}

impl CategoryField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryField::ErrorMessage => "errorMessage",
            CategoryField::ErrorType => "errorType",
            CategoryField::GameName => "gameName",
            CategoryField::GameId => "gameId",
            CategoryField::Platform => "platform",
            CategoryField::PrimaryBrowser => "primaryBrowser",
        }
    }
}

impl std::str::FromStr for CategoryField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "errorMessage" | "error" => Ok(CategoryField::ErrorMessage),
            "errorType" | "type" => Ok(CategoryField::ErrorType),
            "gameName" | "game" => Ok(CategoryField::GameName),
            "gameId" => Ok(CategoryField::GameId),
            "platform" => Ok(CategoryField::Platform),
            "primaryBrowser" | "browser" => Ok(CategoryField::PrimaryBrowser),
            other => Err(format!("unknown category field: {}", other)),
        }
    }
}

impl CanonicalRecord {
    /// Build a record from an event object.
    ///
    /// Crash reporters nest their fields under `bluescreen`; flat exports put
    /// them at the top level. The nested object wins when both exist.
    pub fn from_event(timestamp: DateTime<Utc>, event: &Map<String, Value>) -> Self {
        let fields = match event.get("bluescreen") {
            Some(Value::Object(nested)) => nested,
            _ => event,
        };

        Self {
            timestamp,
            error_message: pick(fields, &["error", "errorMessage"]).and_then(string_value),
            game_name: pick(fields, &["gameName"]).and_then(string_value),
            game_id: pick(fields, &["gameid", "gameId"]).and_then(string_value),
            error_type: pick(fields, &["type", "errorType"]).and_then(string_value),
            silent_error: pick(fields, &["silent error", "silentError"])
                .and_then(|v| v.as_bool()),
            user_agent: pick(fields, &["ua", "userAgent"]).and_then(from_value_lenient),
            session_info: pick(fields, &["sessionInfo"]).and_then(from_value_lenient),
            raw: Value::Object(event.clone()),
        }
    }

    pub fn game_name(&self) -> Option<&str> {
        self.game_name.as_deref()
    }

    pub fn platform(&self) -> Option<&str> {
        self.user_agent.as_ref()?.platform.as_deref()
    }

    pub fn brands(&self) -> &[Brand] {
        self.user_agent
            .as_ref()
            .map_or(&[][..], |ua| ua.brands.as_slice())
    }

    pub fn primary_brand(&self) -> Option<&Brand> {
        self.brands().first()
    }

    pub fn primary_brand_name(&self) -> Option<&str> {
        self.primary_brand()?.brand.as_deref()
    }

    pub fn error_time(&self) -> Option<&ErrorTime> {
        self.session_info.as_ref()?.error_time.as_ref()
    }

    /// Initial viewport `(width, height)`; both sides must be present
    pub fn viewport(&self) -> Option<(u32, u32)> {
        let session = self.session_info.as_ref()?;
        Some((session.initial_width?, session.initial_height?))
    }

    pub fn category(&self, field: CategoryField) -> Option<&str> {
        match field {
            CategoryField::ErrorMessage => self.error_message.as_deref(),
            CategoryField::ErrorType => self.error_type.as_deref(),
            CategoryField::GameName => self.game_name(),
            CategoryField::GameId => self.game_id.as_deref(),
            CategoryField::Platform => self.platform(),
            CategoryField::PrimaryBrowser => self.primary_brand_name(),
        }
    }
}

impl AsRef<CanonicalRecord> for CanonicalRecord {
    fn as_ref(&self) -> &CanonicalRecord {
        self
    }
}

/// Parse an export timestamp.
///
/// Accepts RFC 3339 and the Logs Insights form `2024-01-01 12:00:00.000`,
/// which carries no offset and is read as UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }

    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn pick<'a>(fields: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| fields.get(*name))
}

/// Strings and numbers become category strings; empty strings are absent
fn string_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn from_value_lenient<T: DeserializeOwned>(value: &Value) -> Option<T> {
    serde_json::from_value(value.clone()).ok()
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(string_value(&value))
}

/// Malformed entries keep their slot so index 0 stays the primary brand
fn lenient_brands<'de, D>(deserializer: D) -> Result<BrandList, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(entries) => entries
            .into_iter()
            .map(|entry| serde_json::from_value(entry).unwrap_or_default())
            .collect(),
        _ => BrandList::new(),
    })
}
