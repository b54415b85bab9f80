// src/fallback.rs
//! Fallback chain execution: one (keyword, source) task runs its adapter's
//! strategy tiers in order, first non-empty result wins. A tier that errors
//! or times out is a *tier failure* — logged, counted, and skipped — never
//! a task failure. All tiers exhausted with nothing to show is a valid,
//! successful, empty outcome: we never fabricate data.

use std::time::Duration;

use metrics::counter;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::sources::{FetchStrategy, RawItem};

pub struct FallbackExecutor {
    tier_timeout: Duration,
}

impl FallbackExecutor {
    pub fn new(tier_timeout: Duration) -> Self {
        Self { tier_timeout }
    }

    /// Try each strategy in order. Returns the first non-empty item list,
    /// truncated to `limit`, or an empty vec once every tier has been
    /// consulted. Later tiers are never invoked after a success.
    pub async fn run(
        &self,
        keyword: &str,
        limit: usize,
        strategies: &[Box<dyn FetchStrategy>],
    ) -> Vec<RawItem> {
        for (tier, strategy) in strategies.iter().enumerate() {
            match timeout(self.tier_timeout, strategy.fetch(keyword, limit)).await {
                Ok(Ok(items)) if !items.is_empty() => {
                    let mut items = items;
                    items.truncate(limit);
                    debug!(
                        keyword,
                        tier,
                        strategy = strategy.name(),
                        count = items.len(),
                        "tier succeeded"
                    );
                    return items;
                }
                Ok(Ok(_)) => {
                    debug!(keyword, tier, strategy = strategy.name(), "tier empty");
                }
                Ok(Err(e)) => {
                    warn!(
                        keyword,
                        tier,
                        strategy = strategy.name(),
                        error = ?e,
                        "tier failed, falling through"
                    );
                    counter!("scrape_tier_failures_total", "strategy" => strategy.name())
                        .increment(1);
                }
                Err(_) => {
                    warn!(
                        keyword,
                        tier,
                        strategy = strategy.name(),
                        timeout_secs = self.tier_timeout.as_secs(),
                        "tier timed out, falling through"
                    );
                    counter!("scrape_tier_timeouts_total", "strategy" => strategy.name())
                        .increment(1);
                }
            }
        }
        Vec::new()
    }
}
