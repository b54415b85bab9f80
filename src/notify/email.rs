// src/notify/email.rs
//! Email delivery. `Mailer` is the seam the dispatcher (and tests) work
//! against; `SmtpMailer` is the real transport, `LogMailer` the no-SMTP
//! fallback so the service still runs in environments without credentials.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};
use tracing::info;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, recipients: &[String], subject: &str, body: &str) -> Result<()>;
}

pub struct SmtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// SMTP_HOST, SMTP_USER, SMTP_PASS, NOTIFY_EMAIL_FROM.
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("SMTP_HOST").context("SMTP_HOST missing")?;
        let user = std::env::var("SMTP_USER").context("SMTP_USER missing")?;
        let pass = std::env::var("SMTP_PASS").context("SMTP_PASS missing")?;
        let from_addr = std::env::var("NOTIFY_EMAIL_FROM").context("NOTIFY_EMAIL_FROM missing")?;

        let creds = Credentials::new(user, pass);
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
            .context("invalid SMTP_HOST")?
            .credentials(creds)
            .build();
        let from = from_addr.parse().context("invalid NOTIFY_EMAIL_FROM")?;

        Ok(Self { mailer, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, recipients: &[String], subject: &str, body: &str) -> Result<()> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN);
        for rcpt in recipients {
            let to: Mailbox = rcpt
                .parse()
                .with_context(|| format!("invalid recipient: {rcpt}"))?;
            builder = builder.to(to);
        }
        let msg = builder.body(body.to_string()).context("build email")?;
        self.mailer.send(msg).await.context("send email")?;
        Ok(())
    }
}

/// Fallback used when SMTP is not configured: alerts land in the log.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, recipients: &[String], subject: &str, body: &str) -> Result<()> {
        info!(
            recipients = recipients.join(", "),
            subject,
            body_len = body.len(),
            "email delivery skipped (no SMTP configured)"
        );
        Ok(())
    }
}
