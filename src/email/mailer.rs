//! Seam to the actual mail transport. The transport itself lives outside this
//! service; the default implementation records what would have been sent.

use async_trait::async_trait;

#[derive(Clone, Debug)]
pub struct OutgoingEmail {
    pub to: String,
    pub from: Option<String>,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()>;
}

/// Default mailer: logs the message instead of delivering it. Deployments wire
/// in a real transport behind the same trait.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            bytes = email.html.len(),
            "outgoing email (log transport)"
        );
        Ok(())
    }
}
