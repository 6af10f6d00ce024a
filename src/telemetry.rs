//! Fire-and-forget engagement events.
//!
//! Events go through an unbounded FIFO channel to a single dispatcher task,
//! so they leave in the order the reader acted. A failed send is logged and
//! dropped. The final `read` event uses a [`Beacon`], which is detached from
//! the view and outlives its teardown.

use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::api::{NewsApi, NewsApiClient};
use crate::config;
use crate::model::{Identity, InteractionType, TrackEvent};

pub const VIEW_SOURCE: &str = "article_page";

/// Queue handle for a view's telemetry.
#[derive(Debug)]
pub struct TelemetryClient {
    tx: mpsc::UnboundedSender<TrackEvent>,
    dispatcher: JoinHandle<()>,
}

impl TelemetryClient {
    /// Spawn the dispatcher on the current runtime.
    pub fn spawn(api: Arc<dyn NewsApi>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = tokio::spawn(run_dispatcher(api, rx));
        Self { tx, dispatcher }
    }

    /// Queue an event. Returns false once the dispatcher is gone.
    pub fn dispatch(&self, event: TrackEvent) -> bool {
        let kind = event.interaction_type.as_str();
        match self.tx.send(event) {
            Ok(()) => true,
            Err(_) => {
                warn!(kind, "telemetry dispatcher closed; event dropped");
                false
            }
        }
    }

    /// Close the queue. Already queued events are still sent; await the
    /// returned handle to wait for them.
    pub fn close(self) -> JoinHandle<()> {
        drop(self.tx);
        self.dispatcher
    }
}

#[instrument(skip_all)]
pub async fn run_dispatcher(api: Arc<dyn NewsApi>, mut rx: mpsc::UnboundedReceiver<TrackEvent>) {
    while let Some(event) = rx.recv().await {
        let kind = event.interaction_type.as_str();
        match api.track(&event).await {
            Ok(()) => debug!(kind, article_id = %event.article_id, "event delivered"),
            Err(err) => warn!(?err, kind, article_id = %event.article_id, "event dropped"),
        }
    }
    debug!("telemetry dispatcher stopped");
}

/// Best-effort delivery that does not belong to any view.
pub trait Beacon: Send + Sync {
    /// Returns whether the event was accepted for delivery.
    fn send(&self, event: TrackEvent) -> bool;
}

/// Posts to the tracking endpoint from a detached task.
#[derive(Debug, Clone)]
pub struct HttpBeacon {
    client: NewsApiClient,
    runtime: Handle,
}

impl HttpBeacon {
    pub fn new(client: NewsApiClient, runtime: Handle) -> Self {
        Self { client, runtime }
    }

    /// Bind to the runtime the caller is running on.
    pub fn current(client: NewsApiClient) -> Self {
        Self::new(client, Handle::current())
    }
}

impl Beacon for HttpBeacon {
    fn send(&self, event: TrackEvent) -> bool {
        let request = match self.client.build_track_request(&event) {
            Ok(request) => request,
            Err(err) => {
                warn!(?err, "beacon request not built");
                return false;
            }
        };
        let http = self.client.http().clone();
        self.runtime.spawn(async move {
            if let Err(err) = http.execute(request).await {
                debug!(?err, "beacon lost");
            }
        });
        true
    }
}

/// The `read` event for a finished session, or `None` when the session was
/// too short to count.
pub fn read_event(
    identity: &Identity,
    article_id: &str,
    duration_secs: u64,
    progress: f64,
    reading: &config::Reading,
) -> Option<TrackEvent> {
    if duration_secs <= reading.min_read_seconds {
        return None;
    }
    let mut event = TrackEvent::new(identity, article_id, InteractionType::Read);
    event.duration = Some(duration_secs);
    event.completed = Some(progress >= reading.completion_threshold);
    Some(event)
}

/// The `view` event emitted once per successful load.
pub fn view_event(identity: &Identity, article_id: &str) -> TrackEvent {
    TrackEvent::new(identity, article_id, InteractionType::View).with_source(VIEW_SOURCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Article, RelatedArticle, RemoteInteraction};
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct FlakyApi {
        seen: Mutex<Vec<InteractionType>>,
    }

    #[async_trait]
    impl NewsApi for FlakyApi {
        async fn fetch_article(&self, _id: &str) -> Result<Option<Article>> {
            Ok(None)
        }

        async fn fetch_user_interactions(
            &self,
            _user_id: &str,
            _article_id: &str,
        ) -> Result<Option<RemoteInteraction>> {
            Ok(None)
        }

        async fn track(&self, event: &TrackEvent) -> Result<()> {
            let mut seen = self.seen.lock().await;
            seen.push(event.interaction_type);
            if seen.len() == 1 {
                return Err(anyhow!("boom"));
            }
            Ok(())
        }

        async fn related_articles(
            &self,
            _category_id: &str,
            _exclude_id: &str,
        ) -> Result<Vec<RelatedArticle>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn dispatch_keeps_order_and_survives_failures() {
        let api = Arc::new(FlakyApi::default());
        let client = TelemetryClient::spawn(api.clone());
        let who = Identity::User("u".into());
        for kind in [InteractionType::View, InteractionType::Like, InteractionType::Unlike] {
            assert!(client.dispatch(TrackEvent::new(&who, "a", kind)));
        }
        client.close().await.unwrap();
        assert_eq!(
            *api.seen.lock().await,
            vec![InteractionType::View, InteractionType::Like, InteractionType::Unlike]
        );
    }

    #[test]
    fn read_event_threshold() {
        let reading = config::Reading::default();
        let who = Identity::Guest("g".into());
        assert!(read_event(&who, "a", 10, 100.0, &reading).is_none());

        let short = read_event(&who, "a", 11, 89.9, &reading).unwrap();
        assert_eq!(short.duration, Some(11));
        assert_eq!(short.completed, Some(false));

        let done = read_event(&who, "a", 300, 90.0, &reading).unwrap();
        assert_eq!(done.completed, Some(true));
    }

    #[test]
    fn view_event_is_tagged() {
        let event = view_event(&Identity::Guest("g".into()), "a");
        assert_eq!(event.interaction_type, InteractionType::View);
        assert_eq!(event.source.as_deref(), Some(VIEW_SOURCE));
    }
}
