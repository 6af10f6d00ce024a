//! Optimistic like/save/share state for one (identity, article) pair.
//!
//! Every action updates the in-memory state first, then persists the local
//! snapshot, then hands back the telemetry event the caller should dispatch.
//! Nothing here waits on the network.

use anyhow::{anyhow, Result};
use reqwest::Url;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::{ArticleStats, RemoteInteraction};
use crate::model::{Identity, InteractionState, InteractionType, TrackEvent};
use crate::store::{self, KeyValueStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharePlatform {
    Twitter,
    Facebook,
    Whatsapp,
    Telegram,
    Linkedin,
    Copy,
}

impl SharePlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            SharePlatform::Twitter => "twitter",
            SharePlatform::Facebook => "facebook",
            SharePlatform::Whatsapp => "whatsapp",
            SharePlatform::Telegram => "telegram",
            SharePlatform::Linkedin => "linkedin",
            SharePlatform::Copy => "copy",
        }
    }
}

impl FromStr for SharePlatform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "twitter" | "x" => Ok(SharePlatform::Twitter),
            "facebook" => Ok(SharePlatform::Facebook),
            "whatsapp" => Ok(SharePlatform::Whatsapp),
            "telegram" => Ok(SharePlatform::Telegram),
            "linkedin" => Ok(SharePlatform::Linkedin),
            "copy" => Ok(SharePlatform::Copy),
            other => Err(anyhow!("unknown share platform '{}'", other)),
        }
    }
}

/// Share link for a platform; `Copy` has none, the caller copies `url`.
pub fn share_url(platform: SharePlatform, title: &str, url: &str) -> Option<Url> {
    let link = match platform {
        SharePlatform::Twitter => Url::parse_with_params(
            "https://twitter.com/intent/tweet",
            &[("text", title), ("url", url)],
        ),
        SharePlatform::Facebook => {
            Url::parse_with_params("https://www.facebook.com/sharer/sharer.php", &[("u", url)])
        }
        SharePlatform::Whatsapp => Url::parse_with_params(
            "https://wa.me/",
            &[("text", format!("{} {}", title, url).as_str())],
        ),
        SharePlatform::Telegram => Url::parse_with_params(
            "https://t.me/share/url",
            &[("url", url), ("text", title)],
        ),
        SharePlatform::Linkedin => Url::parse_with_params(
            "https://www.linkedin.com/sharing/share-offsite/",
            &[("url", url)],
        ),
        SharePlatform::Copy => return None,
    };
    link.ok()
}

/// Interaction state bound to its store slot.
pub struct Interactions {
    identity: Identity,
    article_id: String,
    state: InteractionState,
    store: Arc<dyn KeyValueStore>,
}

impl Interactions {
    /// Start from the local snapshot, if any, for this article.
    pub async fn load(
        store: Arc<dyn KeyValueStore>,
        identity: Identity,
        article_id: &str,
    ) -> Result<Self> {
        let state = store::load_snapshot(store.as_ref(), article_id)
            .await?
            .unwrap_or_default();
        Ok(Self {
            identity,
            article_id: article_id.to_string(),
            state,
            store,
        })
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Server-side counters replace the cached ones.
    pub fn apply_stats(&mut self, stats: &ArticleStats) {
        self.state.likes_count = stats.likes;
        self.state.shares_count = stats.shares;
        self.state.saves_count = stats.saves;
    }

    /// Remote flags win; absent flags keep their local value.
    pub async fn reconcile(&mut self, remote: &RemoteInteraction) {
        if let Some(liked) = remote.liked {
            self.state.liked = liked;
        }
        if let Some(saved) = remote.saved {
            self.state.saved = saved;
        }
        if let Some(shared) = remote.shared {
            self.state.shared = shared;
        }
        self.persist().await;
    }

    /// Flip `liked`. Returns the event to send, only for signed-in users.
    pub async fn toggle_like(&mut self) -> Option<TrackEvent> {
        self.state.liked = !self.state.liked;
        self.state.likes_count = step(self.state.likes_count, self.state.liked);
        self.persist().await;
        let kind = if self.state.liked {
            InteractionType::Like
        } else {
            InteractionType::Unlike
        };
        self.remote_event(kind)
    }

    pub async fn toggle_save(&mut self) -> Option<TrackEvent> {
        self.state.saved = !self.state.saved;
        self.state.saves_count = step(self.state.saves_count, self.state.saved);
        self.persist().await;
        let kind = if self.state.saved {
            InteractionType::Save
        } else {
            InteractionType::Unsave
        };
        self.remote_event(kind)
    }

    /// Mark as shared. The `share` event is returned for guests too.
    pub async fn record_share(&mut self, platform: SharePlatform) -> TrackEvent {
        self.state.shared = true;
        self.state.shares_count = self.state.shares_count.saturating_add(1);
        self.persist().await;
        TrackEvent::new(&self.identity, &self.article_id, InteractionType::Share)
            .with_source(platform.as_str())
    }

    fn remote_event(&self, kind: InteractionType) -> Option<TrackEvent> {
        if !self.identity.is_authenticated() {
            debug!(kind = kind.as_str(), "guest action kept local");
            return None;
        }
        Some(TrackEvent::new(&self.identity, &self.article_id, kind))
    }

    async fn persist(&self) {
        if let Err(err) =
            store::save_snapshot(self.store.as_ref(), &self.article_id, &self.state).await
        {
            warn!(?err, article_id = %self.article_id, "failed to persist interaction snapshot");
        }
    }
}

fn step(count: u64, up: bool) -> u64 {
    if up {
        count.saturating_add(1)
    } else {
        count.saturating_sub(1)
    }
}
