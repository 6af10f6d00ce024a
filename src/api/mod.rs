use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::fmt;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::model::TrackEvent;

pub mod model;

pub use model::{Article, ArticleStats, RelatedArticle, RemoteInteraction};

const RELATED_LIMIT: usize = 5;

/// Backend surface used by an article view. Tests substitute a recording
/// double.
#[async_trait]
pub trait NewsApi: Send + Sync {
    /// `Ok(None)` when the backend answers with a non-success status.
    async fn fetch_article(&self, id: &str) -> Result<Option<Article>>;

    async fn fetch_user_interactions(
        &self,
        user_id: &str,
        article_id: &str,
    ) -> Result<Option<RemoteInteraction>>;

    async fn track(&self, event: &TrackEvent) -> Result<()>;

    async fn related_articles(
        &self,
        category_id: &str,
        exclude_id: &str,
    ) -> Result<Vec<RelatedArticle>>;
}

#[derive(Clone)]
pub struct NewsApiClient {
    http: Client,
    base_url: Url,
}

impl fmt::Debug for NewsApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl NewsApiClient {
    pub fn new(base_url: Url, user_agent: &str) -> Self {
        let http = Client::builder()
            .user_agent(user_agent)
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url: with_trailing_slash(base_url),
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let base_url = Url::parse(&cfg.api.base_url)
            .with_context(|| format!("invalid api.base_url {}", cfg.api.base_url))?;
        Ok(Self::new(base_url, &cfg.api.user_agent))
    }

    /// The underlying HTTP client; the beacon reuses its connection pool.
    pub fn http(&self) -> &Client {
        &self.http
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid endpoint path {}", path))
    }

    pub fn build_track_request(&self, event: &TrackEvent) -> Result<reqwest::Request> {
        let endpoint = self.endpoint("interactions/track")?;
        self.http
            .post(endpoint)
            .header("Content-Type", "application/json")
            .json(event)
            .build()
            .context("failed to build track request")
    }

    pub fn build_article_request(&self, id: &str) -> Result<reqwest::Request> {
        let endpoint = self.endpoint(&format!("articles/{}", id))?;
        self.http
            .get(endpoint)
            .header("Cache-Control", "public, s-maxage=60, stale-while-revalidate=59")
            .build()
            .context("failed to build article request")
    }

    pub fn build_interactions_request(
        &self,
        user_id: &str,
        article_id: &str,
    ) -> Result<reqwest::Request> {
        let endpoint = self.endpoint("interactions/user-article")?;
        self.http
            .get(endpoint)
            .query(&[("userId", user_id), ("articleId", article_id)])
            .build()
            .context("failed to build interactions request")
    }

    pub fn build_related_request(
        &self,
        category_id: &str,
        exclude_id: &str,
    ) -> Result<reqwest::Request> {
        let endpoint = self.endpoint("articles")?;
        self.http
            .get(endpoint)
            .query(&[
                ("category_id", category_id.to_string()),
                ("limit", RELATED_LIMIT.to_string()),
                ("exclude", exclude_id.to_string()),
            ])
            .build()
            .context("failed to build related articles request")
    }
}

#[async_trait]
impl NewsApi for NewsApiClient {
    #[instrument(skip(self))]
    async fn fetch_article(&self, id: &str) -> Result<Option<Article>> {
        let request = self.build_article_request(id)?;
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach article endpoint")?;
        if !res.status().is_success() {
            warn!(status = %res.status(), "article fetch rejected");
            return Ok(None);
        }
        let article = res
            .json::<Article>()
            .await
            .context("invalid article JSON")?;
        info!(title = %article.title, "article fetched");
        Ok(Some(article))
    }

    #[instrument(skip(self))]
    async fn fetch_user_interactions(
        &self,
        user_id: &str,
        article_id: &str,
    ) -> Result<Option<RemoteInteraction>> {
        let request = self.build_interactions_request(user_id, article_id)?;
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach interactions endpoint")?;
        if !res.status().is_success() {
            return Err(anyhow!("interactions endpoint returned {}", res.status()));
        }
        let body = res
            .json::<model::RemoteInteractionResp>()
            .await
            .context("invalid interactions JSON")?;
        Ok(body.into_flags())
    }

    #[instrument(skip_all, fields(kind = event.interaction_type.as_str()))]
    async fn track(&self, event: &TrackEvent) -> Result<()> {
        let request = self.build_track_request(event)?;
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach tracking endpoint")?;
        if res.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(anyhow!("tracking endpoint rate limited"));
        }
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("tracking error {}: {}", status, body));
        }
        debug!("event tracked");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn related_articles(
        &self,
        category_id: &str,
        exclude_id: &str,
    ) -> Result<Vec<RelatedArticle>> {
        let request = self.build_related_request(category_id, exclude_id)?;
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach related articles endpoint")?;
        if !res.status().is_success() {
            return Err(anyhow!("related articles endpoint returned {}", res.status()));
        }
        let body = res
            .json::<model::RelatedResp>()
            .await
            .context("invalid related articles JSON")?;
        Ok(body.into_articles())
    }
}

/// `Url::join` drops the last path segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Identity, InteractionType};

    fn client() -> NewsApiClient {
        let base = Url::parse("https://news.example/api").unwrap();
        NewsApiClient::new(base, "newsview-test")
    }

    #[test]
    fn track_request_posts_json() {
        let event = TrackEvent::new(&Identity::User("u1".into()), "a1", InteractionType::Like);
        let request = client().build_track_request(&event).unwrap();
        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().path(), "/api/interactions/track");
        assert_eq!(
            request
                .headers()
                .get("Content-Type")
                .and_then(|h| h.to_str().ok())
                .unwrap(),
            "application/json"
        );
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        let json: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(json["interaction_type"], "like");
        assert_eq!(json["user_id"], "u1");
    }

    #[test]
    fn article_request_targets_id() {
        let request = client().build_article_request("abc-1").unwrap();
        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(request.url().as_str(), "https://news.example/api/articles/abc-1");
        assert!(request.headers().get("Cache-Control").is_some());
    }

    #[test]
    fn interactions_request_encodes_query() {
        let request = client().build_interactions_request("u 1", "a1").unwrap();
        assert_eq!(request.url().path(), "/api/interactions/user-article");
        assert_eq!(request.url().query(), Some("userId=u+1&articleId=a1"));
    }

    #[test]
    fn related_request_excludes_current() {
        let request = client().build_related_request("7", "a1").unwrap();
        assert_eq!(request.url().path(), "/api/articles");
        assert_eq!(
            request.url().query(),
            Some("category_id=7&limit=5&exclude=a1")
        );
    }
}
