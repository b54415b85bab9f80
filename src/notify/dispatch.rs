// src/notify/dispatch.rs
//! The dispatcher: consumes freshly inserted posts from a bounded channel,
//! evaluates triggers, and sends batched emails. One email per trigger per
//! cooldown window; later matches inside the window are suppressed without
//! a log entry, so the quiet period is anchored to the last actual send.

use std::sync::Arc;

use chrono::{Duration, Utc};
use metrics::counter;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::store::{Post, PostStore};

use super::email::Mailer;
use super::log::{NotificationLog, NotificationLogEntry};
use super::NotificationTrigger;

pub struct Dispatcher {
    triggers: Vec<NotificationTrigger>,
    log: Arc<dyn NotificationLog>,
    mailer: Arc<dyn Mailer>,
    posts: Arc<dyn PostStore>,
    /// How far back `recent_unnotified` looks when batching companions.
    batch_window: Duration,
}

impl Dispatcher {
    pub fn new(
        triggers: Vec<NotificationTrigger>,
        log: Arc<dyn NotificationLog>,
        mailer: Arc<dyn Mailer>,
        posts: Arc<dyn PostStore>,
        batch_window: Duration,
    ) -> Self {
        Self {
            triggers,
            log,
            mailer,
            posts,
            batch_window,
        }
    }

    /// Worker loop. Ends when all senders drop.
    pub async fn run(self, mut rx: mpsc::Receiver<Post>) {
        while let Some(post) = rx.recv().await {
            self.on_post(&post).await;
        }
        info!("notification dispatcher stopped");
    }

    /// Evaluate every enabled trigger against one inserted post. Delivery
    /// failures are logged and recorded, never propagated.
    pub async fn on_post(&self, post: &Post) {
        for trigger in self.triggers.iter().filter(|t| t.enabled) {
            if !trigger.matches(post) {
                continue;
            }

            if let Some(last) = self.log.last_success(&trigger.name) {
                let elapsed = Utc::now() - last;
                if elapsed < Duration::seconds(trigger.cooldown_secs as i64) {
                    counter!("notify_suppressed_total", "trigger" => trigger.name.clone())
                        .increment(1);
                    continue;
                }
            }

            let batch = self.batch_for(trigger, post).await;
            let subject = subject_line(trigger, &batch);
            let body = render_body(trigger, &batch);
            let ids: Vec<u64> = batch.iter().map(|p| p.id).collect();

            match self.mailer.send(&trigger.recipients, &subject, &body).await {
                Ok(()) => {
                    counter!("notify_sent_total", "trigger" => trigger.name.clone()).increment(1);
                    self.log.append(NotificationLogEntry {
                        trigger: trigger.name.clone(),
                        post_ids: ids.clone(),
                        success: true,
                        sent_at: Utc::now(),
                    });
                    self.posts.mark_notified(&ids).await;
                    info!(trigger = %trigger.name, posts = ids.len(), "alert sent");
                }
                Err(err) => {
                    counter!("notify_failed_total", "trigger" => trigger.name.clone()).increment(1);
                    self.log.append(NotificationLogEntry {
                        trigger: trigger.name.clone(),
                        post_ids: ids,
                        success: false,
                        sent_at: Utc::now(),
                    });
                    warn!(trigger = %trigger.name, error = %err, "alert delivery failed");
                }
            }
        }
    }

    /// The triggering post plus other recent unnotified posts the same
    /// trigger matches, capped at `max_posts_per_email`. The triggering
    /// post always keeps its slot; companions fill the rest oldest first.
    async fn batch_for(&self, trigger: &NotificationTrigger, post: &Post) -> Vec<Post> {
        let cap = trigger.max_posts_per_email.max(1);
        let mut batch = vec![post.clone()];
        let companions = self
            .posts
            .recent_unnotified(self.batch_window)
            .await
            .into_iter()
            .filter(|p| p.id != post.id && trigger.matches(p));
        for companion in companions {
            if batch.len() >= cap {
                break;
            }
            batch.push(companion);
        }
        batch.sort_by_key(|p| p.id);
        batch
    }
}

fn subject_line(trigger: &NotificationTrigger, batch: &[Post]) -> String {
    if batch.len() == 1 {
        format!("[{}] 1 new mention ({})", trigger.name, batch[0].source)
    } else {
        format!("[{}] {} new mentions", trigger.name, batch.len())
    }
}

fn render_body(trigger: &NotificationTrigger, batch: &[Post]) -> String {
    let mut body = format!("Trigger: {}\n\n", trigger.name);
    for post in batch {
        body.push_str(&format!(
            "- [{}] {} ({:.2} sentiment, {:.2} relevance)\n  {}\n  {}\n\n",
            post.source,
            post.author.as_deref().unwrap_or("unknown"),
            post.sentiment_score,
            post.relevance_score,
            truncate_chars(&post.content, 280),
            post.url,
        ));
    }
    body
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max).collect();
        out.push('…');
        out
    }
}
