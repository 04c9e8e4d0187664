use std::future::Future;
use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::edit::Notice;

pub const DEFAULT_TIPS_URL: &str = "https://jsonplaceholder.typicode.com/posts?_limit=5";
pub const DEFAULT_TIPS_LIMIT: usize = 5;

pub const TIPS_LOADED_MESSAGE: &str = "Tips loaded successfully.";
pub const TIPS_FAILED_MESSAGE: &str = "Failed to load tips. Please try again.";
pub const LOAD_LABEL: &str = "Load Tips";
pub const LOADING_LABEL: &str = "Loading...";

/// Anything that can produce the tip titles.
pub trait TipsSource {
    fn fetch_titles(&self) -> impl Future<Output = anyhow::Result<Vec<String>>>;
}

#[derive(Debug, Deserialize)]
struct TipItem {
    title: String,
}

#[derive(Debug, Clone)]
pub struct HttpTipsSource {
    client: reqwest::Client,
    url: String,
    limit: usize,
}

impl HttpTipsSource {
    pub fn new(url: &str, limit: usize, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed building HTTP client for tips")?;
        Ok(Self {
            client,
            url: url.trim().to_string(),
            limit,
        })
    }
    /// Source built from the `tips.*` settings.
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        Self::new(&cfg.tips_url(), cfg.tips_limit()?, cfg.tips_timeout()?)
    }
}

impl TipsSource for HttpTipsSource {
    #[tracing::instrument(skip(self), fields(url = %self.url))]
    async fn fetch_titles(&self) -> anyhow::Result<Vec<String>> {
        if self.url.is_empty() {
            bail!("tips URL is empty");
        }

        let response = self
            .client
            .get(self.url.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .with_context(|| format!("failed requesting {}", self.url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("server error: {status}");
        }

        let body = response
            .text()
            .await
            .context("failed reading tips response body")?;
        debug!(bytes = body.len(), "received tips body");

        parse_titles(&body, self.limit)
    }
}

/// Titles from a JSON array of objects, at most `limit` of them.
pub fn parse_titles(body: &str, limit: usize) -> anyhow::Result<Vec<String>> {
    let items: Vec<TipItem> =
        serde_json::from_str(body).context("tips response is not a list of titled items")?;
    Ok(items.into_iter().take(limit).map(|item| item.title).collect())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TipsStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// State of the tips panel: the trigger, the status line and the list.
#[derive(Debug, Clone, Default)]
pub struct TipsPanel {
    pub status: TipsStatus,
    pub items: Vec<String>,
    pub message: Option<Notice>,
}

impl TipsPanel {
    pub fn trigger_enabled(&self) -> bool {
        self.status != TipsStatus::Loading
    }

    pub fn trigger_label(&self) -> &'static str {
        if self.trigger_enabled() {
            LOAD_LABEL
        } else {
            LOADING_LABEL
        }
    }

    /// Moves into the in-flight state. Refused while a load is running.
    pub fn begin(&mut self) -> bool {
        if !self.trigger_enabled() {
            warn!("tips load already in flight; ignoring trigger");
            return false;
        }
        self.status = TipsStatus::Loading;
        self.items.clear();
        self.message = None;
        true
    }

    pub fn finish(&mut self, result: anyhow::Result<Vec<String>>) {
        match result {
            Ok(titles) => {
                info!(count = titles.len(), "tips loaded");
                self.items = titles;
                self.status = TipsStatus::Loaded;
                self.message = Some(Notice::success(TIPS_LOADED_MESSAGE));
            }
            Err(err) => {
                error!(error = %format!("{err:#}"), "fetch error");
                self.items.clear();
                self.status = TipsStatus::Failed;
                self.message = Some(Notice::error(TIPS_FAILED_MESSAGE));
            }
        }
    }

    /// One full load cycle against `source`. Returns false if a load was
    /// already running.
    pub async fn load<T: TipsSource>(&mut self, source: &T) -> bool {
        if !self.begin() {
            return false;
        }
        let result = source.fetch_titles().await;
        self.finish(result);
        true
    }
}
