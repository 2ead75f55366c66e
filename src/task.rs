use chrono::{DateTime, Duration, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Design,
    Web,
    Text,
    Video,
    Image,
    Programming,
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Design,
        Category::Web,
        Category::Text,
        Category::Video,
        Category::Image,
        Category::Programming,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Design => "design",
            Category::Web => "web",
            Category::Text => "text",
            Category::Video => "video",
            Category::Image => "image",
            Category::Programming => "programming",
            Category::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Category::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

/// Glyph shown before a task title. Only a few categories have their own;
/// everything else, including strings the server invents later, gets the
/// fallback.
pub fn category_icon(category: &str) -> &'static str {
    match Category::parse(category) {
        Some(Category::Design) => "◆",
        Some(Category::Web) => "▣",
        Some(Category::Text) => "≡",
        _ => "▪",
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "price_text")]
    pub price: String,
    #[serde(deserialize_with = "lenient_datetime")]
    pub expires_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "lenient_datetime_opt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_completed: bool,
    #[serde(default)]
    pub creator: User,
}

impl Task {
    pub fn status_label(&self) -> &'static str {
        if self.is_completed {
            "Completed"
        } else {
            "Active"
        }
    }
}

/// The form the creation wizard accumulates and finally POSTs.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: String,
    pub expires_at: DateTime<Utc>,
}

impl TaskDraft {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            category: String::new(),
            price: String::new(),
            expires_at: now + Duration::days(7),
        }
    }
}

/// Price is only checked for "looks like a number"; the server string is what
/// gets displayed and sent.
pub fn is_numeric_price(price: &str) -> bool {
    let price = price.trim();
    !price.is_empty() && price.parse::<f64>().is_ok_and(f64::is_finite)
}

pub fn format_when(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format("%B %-d, %Y, %I:%M %p")
        .to_string()
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn price_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // Naive timestamps come back when the server runs without time zones.
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn lenient_datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_datetime(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

fn lenient_datetime_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_datetime(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}"))),
        None => Ok(None),
    }
}
