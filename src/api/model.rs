use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Article as returned by `GET /articles/{id}`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Article {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    /// Raw content; its format is only known after resolution.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub content_blocks: Option<Vec<Value>>,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub featured_image_alt: Option<String>,
    /// Numeric or string id depending on the backend generation.
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub category_id: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    /// Either a plain name or an `{id, name, avatar}` object.
    #[serde(default)]
    pub author: Option<Value>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub views_count: u64,
    #[serde(default)]
    pub stats: Option<ArticleStats>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ArticleStats {
    #[serde(deserialize_with = "null_as_zero")]
    pub views: u64,
    #[serde(deserialize_with = "null_as_zero")]
    pub likes: u64,
    #[serde(deserialize_with = "null_as_zero")]
    pub shares: u64,
    #[serde(deserialize_with = "null_as_zero")]
    pub comments: u64,
    #[serde(deserialize_with = "null_as_zero")]
    pub saves: u64,
}

impl Article {
    pub fn raw_content(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    /// Publication time, falling back to creation time.
    pub fn published(&self) -> Option<DateTime<Utc>> {
        self.published_at
            .as_deref()
            .or(self.created_at.as_deref())
            .and_then(parse_timestamp)
    }

    /// Published within the last 24 hours.
    pub fn is_recent(&self, now: DateTime<Utc>) -> bool {
        match self.published() {
            Some(at) => now.signed_duration_since(at) <= Duration::hours(24),
            None => false,
        }
    }

    pub fn author_display(&self) -> Option<String> {
        match &self.author {
            Some(Value::String(name)) if !name.trim().is_empty() => Some(name.clone()),
            Some(Value::Object(obj)) => obj
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| self.author_name.clone()),
            _ => self.author_name.clone(),
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// Counters read as `null` count as zero.
fn null_as_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or_default())
}

/// Flags returned by `GET /interactions/user-article`. Absent fields leave
/// the local value untouched.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RemoteInteraction {
    pub liked: Option<bool>,
    pub saved: Option<bool>,
    pub shared: Option<bool>,
}

/// Either `{success, data: {...}}` or the bare flags.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RemoteInteractionResp {
    Wrapped {
        success: bool,
        data: Option<RemoteInteraction>,
    },
    Bare(RemoteInteraction),
}

impl RemoteInteractionResp {
    pub(crate) fn into_flags(self) -> Option<RemoteInteraction> {
        match self {
            RemoteInteractionResp::Wrapped { success, data } => data.filter(|_| success),
            RemoteInteractionResp::Bare(flags) => Some(flags),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RelatedArticle {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub reading_time: Option<u32>,
    #[serde(default)]
    pub published_at: Option<String>,
}

/// `{articles: [...]}` or `{data: [...]}`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RelatedResp {
    #[serde(default)]
    pub articles: Option<Vec<RelatedArticle>>,
    #[serde(default)]
    pub data: Option<Vec<RelatedArticle>>,
}

impl RelatedResp {
    pub(crate) fn into_articles(self) -> Vec<RelatedArticle> {
        self.articles.or(self.data).unwrap_or_default()
    }
}
