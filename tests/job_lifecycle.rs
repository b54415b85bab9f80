// tests/job_lifecycle.rs
//
// Full pipeline runs against scripted fetch tiers: job creation, fan-out,
// enrichment gating, persistence, and terminal accounting.

mod common;

use std::sync::Arc;

use brand_mention_monitor::jobs::manager::{JobError, NewJob};
use brand_mention_monitor::jobs::JobStatus;
use brand_mention_monitor::PostStore;
use common::{gated_tier, harness, item, static_tier};
use tokio::sync::Semaphore;

#[tokio::test]
async fn job_fans_out_and_completes() {
    let h = harness(vec![
        (
            "forum",
            vec![static_tier(vec![item(
                "Acme dropped the ball, awful outage",
                "https://f.test/1",
            )])],
        ),
        (
            "news",
            vec![static_tier(vec![item(
                "Acme launches a great new vps line",
                "https://n.test/1",
            )])],
        ),
    ]);

    let id = h
        .manager
        .create_job(NewJob {
            keywords: vec!["acme".into()],
            sources: vec!["forum".into(), "news".into()],
            limit: Some(10),
            concurrency: Some(2),
        })
        .expect("create job");

    let view = common::wait_terminal(&h.manager, id).await;
    assert_eq!(view.status, JobStatus::Completed);
    assert_eq!(view.progress.total, 2);
    assert_eq!(view.progress.completed, 2);
    assert_eq!(view.results.len(), 2);
    assert!(view.errors.is_empty());
    assert!(view.finished_at.is_some());
    assert_eq!(h.posts.count().await, 2);
}

#[tokio::test]
async fn irrelevant_items_are_gated_before_persistence() {
    let h = harness(vec![(
        "forum",
        vec![static_tier(vec![
            item("Acme status page is broken again", "https://f.test/1"),
            item("my favourite gardening tricks", "https://f.test/2"),
        ])],
    )]);

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
    assert_eq!(view.results[0].added, 1);
    assert_eq!(h.posts.count().await, 1);
}

#[tokio::test]
async fn empty_source_yield_is_a_success_not_an_error() {
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
    assert_eq!(view.results.len(), 1);
    assert_eq!(view.results[0].added, 0);
    assert!(view.errors.is_empty());
}

#[tokio::test]
async fn progress_never_decreases_between_reads() {
    let gate = Arc::new(Semaphore::new(0));
    let h = harness(vec![("forum", vec![gated_tier(gate.clone(), vec![])])]);

    // Four tasks released one at a time while we poll in between.
    let id = h
        .manager
        .create_job(NewJob {
            keywords: vec!["acme".into(), "acmecloud".into(), "acme vps".into(), "acme down".into()],
            sources: vec!["forum".into()],
            limit: None,
            concurrency: Some(2),
        })
        .expect("create job");

    let mut last_completed = 0;
    for _ in 0..200 {
        let view = h.manager.get_job(id).expect("job exists");
        assert!(
            view.progress.completed >= last_completed,
            "completed went backwards: {} -> {}",
            last_completed,
            view.progress.completed
        );
        assert!(view.progress.completed <= view.progress.total);
        last_completed = view.progress.completed;
        if view.status.is_terminal() {
            break;
        }
        gate.add_permits(1);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let view = common::wait_terminal(&h.manager, id).await;
    assert_eq!(view.status, JobStatus::Completed);
    assert_eq!(view.progress.completed, view.progress.total);
    assert_eq!(view.progress.total, 4);
}

#[tokio::test]
async fn validation_rejects_bad_requests() {
    let h = harness(vec![("forum", vec![static_tier(vec![])])]);

    let cases = vec![
        NewJob {
            keywords: vec![],
            sources: vec!["forum".into()],
            limit: None,
            concurrency: None,
        },
        NewJob {
            keywords: vec!["acme".into()],
            sources: vec![],
            limit: None,
            concurrency: None,
        },
        NewJob {
            keywords: vec!["acme".into()],
            sources: vec!["nosuch".into()],
            limit: None,
            concurrency: None,
        },
        NewJob {
            keywords: vec!["acme".into()],
            sources: vec!["forum".into()],
            limit: Some(0),
            concurrency: None,
        },
        NewJob {
            keywords: vec!["acme".into()],
            sources: vec!["forum".into()],
            limit: None,
            concurrency: Some(0),
        },
    ];
    for case in cases {
        assert!(matches!(
            h.manager.create_job(case),
            Err(JobError::InvalidRequest(_))
        ));
    }
}
