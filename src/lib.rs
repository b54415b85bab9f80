// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod config;
pub mod enrich;
pub mod fallback;
pub mod jobs;
pub mod metrics;
pub mod notify;
pub mod sources;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::config::Settings;
pub use crate::enrich::EnrichmentPipeline;
pub use crate::fallback::FallbackExecutor;
pub use crate::jobs::manager::{JobError, JobManager, NewJob};
pub use crate::sources::{FetchStrategy, RawItem, SourceRegistry};
pub use crate::store::{InMemoryPostStore, PostStore};
