// tests/common/mod.rs
//
// Shared harness: a JobManager wired to in-memory stores and scripted
// fetch tiers, so tests drive the full job pipeline without network.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::{mpsc, Semaphore};

use brand_mention_monitor::config::Settings;
use brand_mention_monitor::enrich::EnrichmentPipeline;
use brand_mention_monitor::fallback::FallbackExecutor;
use brand_mention_monitor::jobs::manager::JobManager;
use brand_mention_monitor::jobs::store::InMemoryJobStore;
use brand_mention_monitor::jobs::{JobId, JobView};
use brand_mention_monitor::sources::{Engagement, FetchStrategy, RawItem, SourceAdapter, SourceRegistry};
use brand_mention_monitor::store::{InMemoryPostStore, Post};

pub fn item(content: &str, url: &str) -> RawItem {
    RawItem {
        source: "test".into(),
        author: Some("tester".into()),
        content: content.into(),
        url: url.into(),
        created_at: chrono::Utc::now(),
        engagement: Engagement::default(),
    }
}

/// Always returns the same items.
pub struct StaticTier {
    pub items: Vec<RawItem>,
}

#[async_trait]
impl FetchStrategy for StaticTier {
    async fn fetch(&self, _keyword: &str, limit: usize) -> Result<Vec<RawItem>> {
        Ok(self.items.iter().take(limit).cloned().collect())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Blocks until the test hands out a permit, then returns its items.
pub struct GatedTier {
    pub gate: Arc<Semaphore>,
    pub items: Vec<RawItem>,
}

#[async_trait]
impl FetchStrategy for GatedTier {
    async fn fetch(&self, _keyword: &str, limit: usize) -> Result<Vec<RawItem>> {
        let permit = self.gate.acquire().await?;
        permit.forget();
        Ok(self.items.iter().take(limit).cloned().collect())
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}

pub fn static_tier(items: Vec<RawItem>) -> Box<dyn FetchStrategy> {
    Box::new(StaticTier { items })
}

pub fn gated_tier(gate: Arc<Semaphore>, items: Vec<RawItem>) -> Box<dyn FetchStrategy> {
    Box::new(GatedTier { gate, items })
}

pub struct Harness {
    pub manager: Arc<JobManager>,
    pub posts: Arc<InMemoryPostStore>,
    pub notify_rx: mpsc::Receiver<Post>,
}

pub fn settings() -> Settings {
    Settings::from_toml_str(
        r#"
[brand]
name = "Acme"
aliases = ["acmecloud"]
domains = ["acme.com"]
products = ["vps"]
"#,
    )
    .expect("test settings")
}

/// One adapter per entry: (source id, ordered tiers).
pub fn harness(adapters: Vec<(&str, Vec<Box<dyn FetchStrategy>>)>) -> Harness {
    let mut registry = SourceRegistry::new();
    for (id, strategies) in adapters {
        registry.register(SourceAdapter {
            id: id.to_string(),
            strategies,
        });
    }
    let posts = Arc::new(InMemoryPostStore::new());
    let (tx, rx) = mpsc::channel(64);
    let manager = Arc::new(JobManager::new(
        Arc::new(InMemoryJobStore::new()),
        Arc::new(registry),
        Arc::new(FallbackExecutor::new(Duration::from_secs(60))),
        Arc::new(EnrichmentPipeline::from_settings(&settings())),
        posts.clone(),
        tx,
        8,
        25,
    ));
    Harness {
        manager,
        posts,
        notify_rx: rx,
    }
}

pub async fn wait_terminal(manager: &JobManager, id: JobId) -> JobView {
    for _ in 0..500 {
        let view = manager.get_job(id).expect("job exists");
        if view.status.is_terminal() {
            return view;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job never reached a terminal status");
}

pub async fn wait_running(manager: &JobManager, id: JobId) -> JobView {
    use brand_mention_monitor::jobs::JobStatus;
    for _ in 0..500 {
        let view = manager.get_job(id).expect("job exists");
        if view.status == JobStatus::Running {
            return view;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job never started running");
}
