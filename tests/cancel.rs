// tests/cancel.rs
//
// Cancellation semantics: in-flight tasks finish, queued tasks are
// skipped, progress still reaches total, and the job lands on Cancelled.
// Cancelling a terminal job is a no-op.

mod common;

use std::sync::Arc;

use brand_mention_monitor::jobs::manager::NewJob;
use brand_mention_monitor::jobs::JobStatus;
use common::{gated_tier, harness, item, static_tier};
use tokio::sync::Semaphore;

#[tokio::test]
async fn cancel_skips_queued_tasks_and_lands_on_cancelled() {
    let gate = Arc::new(Semaphore::new(0));
    let h = harness(vec![(
        "forum",
        vec![gated_tier(
            gate.clone(),
            vec![item("Acme outage, terrible", "https://f.test/1")],
        )],
    )]);

    // Three tasks, one worker: the first blocks on the gate, two queue.
    let id = h
        .manager
        .create_job(NewJob {
            keywords: vec!["acme".into(), "acmecloud".into(), "acme vps".into()],
            sources: vec!["forum".into()],
            limit: None,
            concurrency: Some(1),
        })
        .expect("create job");

    common::wait_running(&h.manager, id).await;
    let view = h.manager.cancel_job(id).expect("cancel");
    assert!(!view.status.is_terminal(), "still draining the in-flight task");

    // Let the in-flight task finish; the queued ones must be skipped.
    gate.add_permits(3);
    let view = common::wait_terminal(&h.manager, id).await;
    assert_eq!(view.status, JobStatus::Cancelled);
    assert_eq!(view.progress.completed, view.progress.total);
    assert!(view.results.len() <= 1);
    assert!(view.errors.is_empty());
}

#[tokio::test]
async fn cancelling_a_finished_job_changes_nothing() {
    let h = harness(vec![("forum", vec![static_tier(vec![])])]);
    let id = h
        .manager
        .create_job(NewJob {
            keywords: vec!["acme".into()],
            sources: vec!["forum".into()],
            limit: None,
            concurrency: None,
        })
        .expect("create job");

    let view = common::wait_terminal(&h.manager, id).await;
    assert_eq!(view.status, JobStatus::Completed);

    let after = h.manager.cancel_job(id).expect("cancel is idempotent");
    assert_eq!(after.status, JobStatus::Completed);
}

#[tokio::test]
async fn cancel_all_reports_how_many_jobs_were_signalled() {
    let gate = Arc::new(Semaphore::new(0));
    let h = harness(vec![(
        "forum",
        vec![gated_tier(gate.clone(), vec![])],
    )]);

    let mut ids = Vec::new();
    for keyword in ["acme", "acmecloud"] {
        ids.push(
            h.manager
                .create_job(NewJob {
                    keywords: vec![keyword.into()],
                    sources: vec!["forum".into()],
                    limit: None,
                    concurrency: Some(1),
                })
                .expect("create job"),
        );
    }
    for id in &ids {
        common::wait_running(&h.manager, *id).await;
    }

    assert_eq!(h.manager.cancel_all(), 2);
    gate.add_permits(8);
    for id in ids {
        let view = common::wait_terminal(&h.manager, id).await;
        assert_eq!(view.status, JobStatus::Cancelled);
    }
    assert_eq!(h.manager.cancel_all(), 0);
}
