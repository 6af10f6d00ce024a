//! One reader looking at one article: mount, scroll and act, then teardown.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::api::{Article, NewsApi, RelatedArticle};
use crate::config::Config;
use crate::content::{self, FormatPolicy, RenderedContent};
use crate::interaction::{share_url, Interactions, SharePlatform};
use crate::model::{Identity, InteractionState};
use crate::reading::{self, ReadingTracker, ScrollSample, ScrollUpdate, SectionOffset};
use crate::store::{self, KeyValueStore};
use crate::telemetry::{self, Beacon, TelemetryClient};

/// Related articles shown under the body.
const RELATED_SHOWN: usize = 4;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("article {0} not found")]
    NotFound(String),
    #[error("local store unavailable: {0:#}")]
    Store(anyhow::Error),
}

/// Shared services every view is mounted against.
#[derive(Clone)]
pub struct ViewContext {
    pub api: Arc<dyn NewsApi>,
    pub store: Arc<dyn KeyValueStore>,
    pub beacon: Arc<dyn Beacon>,
    pub config: Config,
}

/// What an action produced, for the caller to present.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareOutcome {
    /// `None` for `copy`; the caller copies [`ArticleView::article`]'s URL.
    pub url: Option<reqwest::Url>,
    pub state: InteractionState,
}

/// Summary of a finished view.
#[derive(Debug)]
pub struct Teardown {
    pub duration_secs: u64,
    pub read_sent: bool,
    dispatcher: Option<JoinHandle<()>>,
}

impl Teardown {
    /// Wait until events queued before teardown have been sent or dropped.
    pub async fn drained(self) {
        if let Some(dispatcher) = self.dispatcher {
            if let Err(err) = dispatcher.await {
                warn!(?err, "telemetry dispatcher ended abnormally");
            }
        }
    }
}

/// A mounted article view.
///
/// Call [`ArticleView::teardown`] when the reader leaves. A view dropped
/// without it is torn down at drop time: the related fetch is aborted and the
/// `read` event still goes out, but queued events drain in the background.
pub struct ArticleView {
    article: Article,
    rendered: RenderedContent,
    reading_minutes: u32,
    is_new: bool,
    interactions: Interactions,
    tracker: ReadingTracker,
    /// Taken on teardown.
    telemetry: Option<TelemetryClient>,
    beacon: Arc<dyn Beacon>,
    config: Config,
    started_at: DateTime<Utc>,
    related_task: Option<JoinHandle<Vec<RelatedArticle>>>,
    related: Option<Vec<RelatedArticle>>,
}

impl ArticleView {
    pub async fn mount(ctx: &ViewContext, article_id: &str) -> Result<Self, ViewError> {
        Self::mount_at(ctx, article_id, Utc::now()).await
    }

    #[instrument(skip(ctx, now))]
    pub async fn mount_at(
        ctx: &ViewContext,
        article_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, ViewError> {
        let article_id = article_id.trim();
        let article = match ctx.api.fetch_article(article_id).await {
            Ok(Some(article)) => article,
            Ok(None) => return Err(ViewError::NotFound(article_id.to_string())),
            Err(err) => {
                warn!(?err, "article fetch failed");
                return Err(ViewError::NotFound(article_id.to_string()));
            }
        };

        let policy = FormatPolicy::from_config(&ctx.config.content);
        let resolved = content::resolve(
            article.raw_content(),
            article.content_blocks.as_deref(),
            &policy,
        );
        let rendered = content::render(&resolved);
        let reading_minutes =
            reading::reading_time_minutes(rendered.word_count, ctx.config.reading.words_per_minute);
        info!(
            format = rendered.format.as_str(),
            reading_minutes,
            sections = rendered.toc.len(),
            "article rendered"
        );

        let identity = store::resolve_identity(ctx.store.as_ref())
            .await
            .map_err(ViewError::Store)?;
        let mut interactions = Interactions::load(ctx.store.clone(), identity.clone(), &article.id)
            .await
            .map_err(ViewError::Store)?;
        if let Some(stats) = &article.stats {
            interactions.apply_stats(stats);
        }
        if let Identity::User(user_id) = &identity {
            match ctx.api.fetch_user_interactions(user_id, &article.id).await {
                Ok(Some(remote)) => interactions.reconcile(&remote).await,
                Ok(None) => debug!("no remote interactions"),
                Err(err) => warn!(?err, "interaction reconcile failed; keeping local state"),
            }
        }

        let telemetry = TelemetryClient::spawn(ctx.api.clone());
        telemetry.dispatch(telemetry::view_event(&identity, &article.id));

        let related_task = article
            .category_id
            .clone()
            .map(|category_id| spawn_related(ctx.api.clone(), category_id, article.id.clone()));

        let tracker = ReadingTracker::from_config(Vec::new(), &ctx.config.reading);
        Ok(Self {
            is_new: article.is_recent(now),
            article,
            rendered,
            reading_minutes,
            interactions,
            tracker,
            telemetry: Some(telemetry),
            beacon: ctx.beacon.clone(),
            config: ctx.config.clone(),
            started_at: now,
            related_task,
            related: None,
        })
    }

    pub fn article(&self) -> &Article {
        &self.article
    }

    pub fn rendered(&self) -> &RenderedContent {
        &self.rendered
    }

    pub fn reading_minutes(&self) -> u32 {
        self.reading_minutes
    }

    /// Published within the last day.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn identity(&self) -> &Identity {
        self.interactions.identity()
    }

    pub fn interaction_state(&self) -> &InteractionState {
        self.interactions.state()
    }

    pub fn progress(&self) -> f64 {
        self.tracker.progress()
    }

    pub fn active_section(&self) -> Option<&str> {
        self.tracker.active_section()
    }

    /// Heading positions after layout, in table-of-contents order.
    pub fn set_section_offsets(&mut self, sections: Vec<SectionOffset>) {
        self.tracker.set_sections(sections);
    }

    pub fn on_scroll(&mut self, sample: ScrollSample) -> ScrollUpdate {
        self.tracker.on_scroll(sample)
    }

    pub async fn like(&mut self) -> &InteractionState {
        if let Some(event) = self.interactions.toggle_like().await {
            self.dispatch(event);
        }
        self.interactions.state()
    }

    pub async fn save(&mut self) -> &InteractionState {
        if let Some(event) = self.interactions.toggle_save().await {
            self.dispatch(event);
        }
        self.interactions.state()
    }

    pub async fn share(&mut self, platform: SharePlatform, page_url: &str) -> ShareOutcome {
        let event = self.interactions.record_share(platform).await;
        self.dispatch(event);
        ShareOutcome {
            url: share_url(platform, &self.article.title, page_url),
            state: self.interactions.state().clone(),
        }
    }

    /// Related articles, waiting for the background fetch on first call.
    /// Any failure yields an empty list.
    pub async fn related(&mut self) -> &[RelatedArticle] {
        if self.related.is_none() {
            let list = match self.related_task.take() {
                Some(task) => task.await.unwrap_or_else(|err| {
                    warn!(?err, "related articles task ended abnormally");
                    Vec::new()
                }),
                None => Vec::new(),
            };
            self.related = Some(list);
        }
        self.related.as_deref().unwrap_or_default()
    }

    fn dispatch(&self, event: crate::model::TrackEvent) {
        if let Some(telemetry) = &self.telemetry {
            telemetry.dispatch(event);
        }
    }

    pub fn teardown(self) -> Teardown {
        self.teardown_at(Utc::now())
    }

    /// Stop background work and flush the `read` event through the beacon.
    pub fn teardown_at(mut self, now: DateTime<Utc>) -> Teardown {
        self.close(now)
    }

    fn close(&mut self, now: DateTime<Utc>) -> Teardown {
        if let Some(task) = self.related_task.take() {
            task.abort();
        }

        let duration_secs = now
            .signed_duration_since(self.started_at)
            .num_seconds()
            .max(0) as u64;
        let read_sent = match telemetry::read_event(
            self.interactions.identity(),
            &self.article.id,
            duration_secs,
            self.tracker.progress(),
            &self.config.reading,
        ) {
            Some(event) => self.beacon.send(event),
            None => false,
        };
        debug!(duration_secs, read_sent, "article view closed");

        Teardown {
            duration_secs,
            read_sent,
            dispatcher: self.telemetry.take().map(TelemetryClient::close),
        }
    }
}

impl Drop for ArticleView {
    fn drop(&mut self) {
        if self.telemetry.is_some() {
            debug!(article_id = %self.article.id, "view dropped without teardown");
            self.close(Utc::now());
        }
    }
}

fn spawn_related(
    api: Arc<dyn NewsApi>,
    category_id: String,
    article_id: String,
) -> JoinHandle<Vec<RelatedArticle>> {
    tokio::spawn(async move {
        match api.related_articles(&category_id, &article_id).await {
            Ok(list) => list
                .into_iter()
                .filter(|a| a.id != article_id)
                .take(RELATED_SHOWN)
                .collect(),
            Err(err) => {
                warn!(?err, "related articles unavailable");
                Vec::new()
            }
        }
    })
}
