//! Digest delivery over SMTP.

use anyhow::{Context, Result};
use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message as MimeMessage, Tokio1Executor};

use crate::config::{Config, SmtpSettings};
use crate::digest::Digest;

/// Something that can hand a rendered digest to its subscribers.
#[allow(async_fn_in_trait)]
pub trait DigestTransport {
    async fn deliver(&self, digest: &Digest) -> Result<()>;
}

/// Sends digests through an implicit-TLS SMTP relay.
///
/// Credentials are resolved from the config at delivery time, so a run with
/// nothing to send never needs them.
pub struct SmtpMailer {
    config: Config,
    subscribers: Vec<String>,
}

impl SmtpMailer {
    #[must_use]
    pub fn new(config: Config, subscribers: Vec<String>) -> Self {
        Self {
            config,
            subscribers,
        }
    }

    /// Build the multipart/alternative message for a digest.
    pub fn build_message(&self, settings: &SmtpSettings, digest: &Digest) -> Result<MimeMessage> {
        let from: Mailbox = settings
            .username
            .parse()
            .context("Invalid sender email address")?;

        let mut builder = MimeMessage::builder().from(from).subject(&digest.subject);
        for subscriber in &self.subscribers {
            let to: Mailbox = subscriber
                .parse()
                .with_context(|| format!("Invalid subscriber address: {subscriber}"))?;
            builder = builder.to(to);
        }

        builder
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(digest.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(digest.html.clone()),
                    ),
            )
            .context("Failed to build email message")
    }
}

impl DigestTransport for SmtpMailer {
    async fn deliver(&self, digest: &Digest) -> Result<()> {
        let settings = self.config.smtp()?;
        let email = self.build_message(&settings, digest)?;

        let creds = Credentials::new(settings.username.clone(), settings.password.clone());

        let mailer: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
                .context("Failed to create SMTP transport")?
                .port(settings.port)
                .credentials(creds)
                .build();

        tracing::info!(
            to = %self.subscribers.join(", "),
            host = %settings.host,
            messages = digest.message_ids.len(),
            "digest_sending"
        );

        mailer
            .send(email)
            .await
            .context("Failed to send email via SMTP")?;

        tracing::info!(subject = %digest.subject, "digest_sent");

        Ok(())
    }
}
