use std::fmt;
use std::time::Duration;

use anyhow::Context as _;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};

use crate::domain::ports::Notifier;

pub const SUBJECT: &str = "Your WiFi Access Code";

fn validity_minutes(validity_secs: u64) -> u64 {
    validity_secs.div_ceil(60)
}

/// Plain-text part sent with every code.
pub fn compose_text(code: &str, validity_secs: u64) -> String {
    let minutes = validity_minutes(validity_secs);
    format!(
        "WiFi Access Code\n\n\
         Your One-Time Password (OTP) is: {code}\n\n\
         This code is valid for {minutes} minutes.\n\
         Enter this code on the WiFi login page to connect to the internet.\n\n\
         If you didn't request this code, please ignore this email.\n"
    )
}

/// HTML alternative of [`compose_text`].
pub fn compose_html(code: &str, validity_secs: u64) -> String {
    let minutes = validity_minutes(validity_secs);
    format!(
        "<html>\n\
         <body style=\"font-family: Arial, sans-serif; padding: 20px;\">\n\
         <h2>WiFi Access Code</h2>\n\
         <p>Your One-Time Password (OTP) for WiFi access is:</p>\n\
         <h1 style=\"letter-spacing: 12px;\">{code}</h1>\n\
         <p>This code is valid for <strong>{minutes} minutes</strong>.</p>\n\
         <p>Enter this code on the WiFi login page to connect to the internet.</p>\n\
         <hr>\n\
         <p style=\"font-size: 12px; color: #999;\">\n\
         If you didn't request this code, please ignore this email.\n\
         </p>\n\
         </body>\n\
         </html>\n"
    )
}

/// Simulation mode: logs the message instead of sending it.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    validity_secs: u64,
}

impl LogNotifier {
    pub fn new(validity_secs: u64) -> Self {
        Self { validity_secs }
    }
}

impl Notifier for LogNotifier {
    async fn deliver(&self, address: &str, code: &str) -> bool {
        info!(
            email = %address,
            subject = SUBJECT,
            otp = %code,
            valid_for_secs = self.validity_secs,
            "email simulation: otp not sent"
        );
        true
    }
}

/// SMTP submission settings. STARTTLS and login are always used.
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from", &self.from)
            .finish()
    }
}

/// Sends each code as a multipart text and HTML message over SMTP.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    validity_secs: u64,
}

impl SmtpNotifier {
    pub fn new(settings: SmtpSettings, validity_secs: u64, timeout: Duration) -> anyhow::Result<Self> {
        let from: Mailbox = settings
            .from
            .parse()
            .with_context(|| format!("invalid sender address {:?}", settings.from))?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.server)
            .with_context(|| format!("smtp relay {}", settings.server))?
            .port(settings.port)
            .credentials(Credentials::new(settings.username, settings.password))
            .timeout(Some(timeout))
            .build();
        Ok(Self {
            transport,
            from,
            validity_secs,
        })
    }

    pub fn build_message(&self, address: &str, code: &str) -> anyhow::Result<Message> {
        let to: Mailbox = address
            .parse()
            .with_context(|| format!("invalid recipient {address:?}"))?;
        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(SUBJECT)
            .multipart(MultiPart::alternative_plain_html(
                compose_text(code, self.validity_secs),
                compose_html(code, self.validity_secs),
            ))
            .context("build otp email")
    }
}

impl Notifier for SmtpNotifier {
    async fn deliver(&self, address: &str, code: &str) -> bool {
        let message = match self.build_message(address, code) {
            Ok(message) => message,
            Err(e) => {
                warn!(email = %address, error = %e, "otp email not built");
                return false;
            }
        };
        match self.transport.send(message).await {
            Ok(_) => {
                info!(email = %address, "email sent");
                true
            }
            Err(e) => {
                warn!(email = %address, error = %e, "email send failed");
                false
            }
        }
    }
}

/// The notifier selected by configuration.
pub enum DeliveryNotifier {
    Simulated(LogNotifier),
    Smtp(SmtpNotifier),
}

impl Notifier for DeliveryNotifier {
    async fn deliver(&self, address: &str, code: &str) -> bool {
        match self {
            Self::Simulated(n) => n.deliver(address, code).await,
            Self::Smtp(n) => n.deliver(address, code).await,
        }
    }
}
