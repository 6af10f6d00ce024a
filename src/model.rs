use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InteractionType {
    View,
    Like,
    Unlike,
    Save,
    Unsave,
    Share,
    Read,
}

impl InteractionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::View => "view",
            InteractionType::Like => "like",
            InteractionType::Unlike => "unlike",
            InteractionType::Save => "save",
            InteractionType::Unsave => "unsave",
            InteractionType::Share => "share",
            InteractionType::Read => "read",
        }
    }
}

/// Who is reading. Guests are tracked locally only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    User(String),
    Guest(String),
}

impl Identity {
    pub fn id(&self) -> &str {
        match self {
            Identity::User(id) | Identity::Guest(id) => id,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::User(_))
    }
}

/// Per (identity, article) interaction snapshot, stored locally as JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct InteractionState {
    pub liked: bool,
    pub saved: bool,
    pub shared: bool,
    pub likes_count: u64,
    pub shares_count: u64,
    pub saves_count: u64,
}

/// One table-of-contents entry, in document order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TocEntry {
    pub id: String,
    pub title: String,
    pub level: u8,
}

/// A single telemetry record sent to the tracking endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackEvent {
    pub user_id: String,
    pub article_id: String,
    pub interaction_type: InteractionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TrackEvent {
    pub fn new(identity: &Identity, article_id: &str, kind: InteractionType) -> Self {
        Self {
            user_id: identity.id().to_string(),
            article_id: article_id.to_string(),
            interaction_type: kind,
            source: None,
            duration: None,
            completed: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}
