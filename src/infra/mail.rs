//! Mail transports: a log sink for development and an SMTP relay for deployments.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::info;

use crate::application::mail::{Mailer, OutgoingMail};
use crate::config::SmtpSettings;

use super::error::InfraError;

const REDACTED: &str = "<redacted>";

/// Writes outgoing mail to the log instead of delivering it.
///
/// The last path segment of every link is redacted; reset links carry their token there.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), InfraError> {
        info!(
            target = "lireddit::infra::mail",
            to = %mail.to,
            subject = %mail.subject,
            html = %redact_links(&mail.html),
            "outgoing mail"
        );
        Ok(())
    }
}

/// Delivers mail through an SMTP relay.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Builds the transport. No connection is made until the first send.
    pub fn new(settings: &SmtpSettings, from: &str) -> Result<Self, InfraError> {
        let from: Mailbox = from
            .parse()
            .map_err(|err| InfraError::configuration(format!("invalid mail.from: {err}")))?;

        let builder = if settings.implicit_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
        }
        .map_err(|err| InfraError::configuration(format!("invalid smtp relay: {err}")))?;

        let mut builder = builder.port(settings.port);
        if let Some((user, password)) = settings.credentials.as_ref() {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        info!(
            target = "lireddit::infra::mail",
            host = %settings.host,
            port = settings.port,
            "smtp mailer configured"
        );
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), InfraError> {
        let to = mail.to.clone();
        let message = build_message(&self.from, mail)?;
        self.transport
            .send(message)
            .await
            .map_err(|err| InfraError::mail(format!("smtp send failed: {err}")))?;
        info!(target = "lireddit::infra::mail", to = %to, "mail delivered");
        Ok(())
    }
}

fn build_message(from: &Mailbox, mail: OutgoingMail) -> Result<Message, InfraError> {
    let to: Mailbox = mail
        .to
        .parse()
        .map_err(|err| InfraError::mail(format!("invalid recipient `{}`: {err}", mail.to)))?;

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(mail.subject)
        .header(ContentType::TEXT_HTML)
        .body(mail.html)
        .map_err(|err| InfraError::mail(format!("failed to build message: {err}")))
}

/// Replace the final path segment of each `href` with a placeholder.
fn redact_links(html: &str) -> String {
    const HREF: &str = "href=\"";

    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(start) = rest.find(HREF) {
        let value_start = start + HREF.len();
        out.push_str(&rest[..value_start]);
        rest = &rest[value_start..];

        let end = rest.find('"').unwrap_or(rest.len());
        let url = &rest[..end];
        if let Some(slash) = url.rfind('/') {
            out.push_str(&url[..=slash]);
        }
        out.push_str(REDACTED);
        rest = &rest[end..];
    }
    out.push_str(rest);
    out
}
