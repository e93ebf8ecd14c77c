use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::AsyncSmtpTransport;
use lettre::AsyncTransport;
use lettre::Message;
use lettre::Tokio1Executor;

use crate::config::MailConfig;
use crate::domain::user::errors::MailerError;
use crate::domain::user::ports::Mailer;

/// SMTP adapter for the mail port.
///
/// Callers treat delivery as fire-and-forget; this adapter only reports
/// what happened, it does not retry.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, MailerError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| MailerError::DeliveryFailed(e.to_string()))?
            .credentials(Credentials::new(
                config.smtp_user.clone(),
                config.smtp_password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailerError> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| MailerError::InvalidMessage(format!("from address: {}", e)))?,
            )
            .to(to
                .parse()
                .map_err(|e| MailerError::InvalidMessage(format!("to address: {}", e)))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| MailerError::InvalidMessage(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailerError::DeliveryFailed(e.to_string()))?;

        Ok(())
    }
}
