//! Outbound notifications: OTP emails and SMS through carrier
//! email-to-SMS gateways.
//!
//! Delivery is a single attempt through the configured SMTP relay.  There
//! is no queue, no retry and no delivery confirmation; callers only learn
//! whether the relay accepted the message.

use std::error::Error as StdError;
use std::future::Future;

use lettre::address::AddressError;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;

/// Carrier name → email-to-SMS gateway domain.
const CARRIER_GATEWAYS: &[(&str, &str)] = &[
    ("att", "txt.att.net"),
    ("tmobile", "tmomail.net"),
    ("verizon", "vtext.com"),
    ("sprint", "messaging.sprintpcs.com"),
    ("boost", "sms.myboostmobile.com"),
    ("cricket", "sms.cricketwireless.net"),
    ("uscellular", "email.uscc.net"),
    ("metropcs", "mymetropcs.com"),
    ("virgin", "vmobl.com"),
    ("googlefi", "msg.fi.google.com"),
];

/// Resolve a carrier name to its gateway domain.  Case-insensitive.
pub fn gateway_domain(provider: &str) -> Option<&'static str> {
    let provider = provider.trim();
    CARRIER_GATEWAYS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(provider))
        .map(|(_, domain)| *domain)
}

/// Gateway address for a phone number: its digits at the carrier domain.
pub fn gateway_address(number: &str, domain: &str) -> String {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    format!("{digits}@{domain}")
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Mail relay credentials are not configured")]
    NotConfigured,

    #[error("Unknown SMS provider: {0}")]
    UnknownProvider(String),

    #[error("Invalid address: {0}")]
    Address(#[from] AddressError),

    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Transport error: {0}")]
    Transport(Box<dyn StdError + Send + Sync>),
}

/// Something that can deliver codes and texts.  Failures are reported as
/// `false`; detail is logged, never returned.
pub trait Notifier: Send + Sync + 'static {
    fn send_otp_email(&self, email: &str, code: u32) -> impl Future<Output = bool> + Send;

    /// Text every number in turn, stopping at the first failure.
    fn send_sms_via_gateway(
        &self,
        numbers: &[String],
        message: &str,
        provider: &str,
    ) -> impl Future<Output = bool> + Send;
}

/// Hands a finished message to the relay.
pub trait MailTransport: Send + Sync + 'static {
    type Error: StdError + Send + Sync + 'static;

    fn deliver(&self, email: Message) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

impl MailTransport for AsyncSmtpTransport<Tokio1Executor> {
    type Error = lettre::transport::smtp::Error;

    async fn deliver(&self, email: Message) -> Result<(), Self::Error> {
        self.send(email).await.map(|_| ())
    }
}

struct Relay<T> {
    transport: T,
    from: Mailbox,
}

/// [`Notifier`] backed by an authenticated STARTTLS relay.
pub struct SmtpNotifier<T = AsyncSmtpTransport<Tokio1Executor>> {
    relay: Option<Relay<T>>,
    app_name: String,
}

impl SmtpNotifier {
    /// Build the relay client.  Without usable credentials the notifier
    /// still constructs, but every delivery fails.
    pub fn from_config(config: &ServerConfig) -> Self {
        let relay = match Self::relay(config) {
            Ok(relay) => Some(relay),
            Err(e) => {
                warn!(error = %e, "Mail relay unavailable, deliveries will fail");
                None
            }
        };

        Self {
            relay,
            app_name: config.app_name.clone(),
        }
    }

    fn relay(
        config: &ServerConfig,
    ) -> Result<Relay<AsyncSmtpTransport<Tokio1Executor>>, NotifyError> {
        let creds = config.mail.as_ref().ok_or(NotifyError::NotConfigured)?;
        let from: Mailbox = creds.user.parse()?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(Credentials::new(creds.user.clone(), creds.password.clone()))
            .build();

        info!(host = %config.smtp_host, port = config.smtp_port, "Mail relay configured");
        Ok(Relay { transport, from })
    }
}

impl<T: MailTransport> SmtpNotifier<T> {
    async fn send(&self, to: &str, subject: Option<&str>, body: &str) -> Result<(), NotifyError> {
        let relay = self.relay.as_ref().ok_or(NotifyError::NotConfigured)?;

        let mut builder = Message::builder()
            .from(relay.from.clone())
            .to(to.parse()?)
            .header(ContentType::TEXT_PLAIN);
        if let Some(subject) = subject {
            builder = builder.subject(subject);
        }
        let email = builder.body(body.to_string())?;

        relay
            .transport
            .deliver(email)
            .await
            .map_err(|e| NotifyError::Transport(Box::new(e)))?;
        debug!(to, "Relay accepted message");
        Ok(())
    }
}

impl<T: MailTransport> Notifier for SmtpNotifier<T> {
    async fn send_otp_email(&self, email: &str, code: u32) -> bool {
        let subject = format!("Your OTP for {}", self.app_name);
        let body = format!("Your OTP is {code} ");

        match self.send(email, Some(&subject), &body).await {
            Ok(()) => {
                info!(email, "OTP sent");
                true
            }
            Err(e) => {
                warn!(email, error = %e, "Failed to send OTP");
                false
            }
        }
    }

    async fn send_sms_via_gateway(&self, numbers: &[String], message: &str, provider: &str) -> bool {
        let Some(domain) = gateway_domain(provider) else {
            warn!(error = %NotifyError::UnknownProvider(provider.to_string()), "SMS not sent");
            return false;
        };

        for number in numbers {
            let address = gateway_address(number, domain);
            if let Err(e) = self.send(&address, None, message).await {
                warn!(to = %address, error = %e, "SMS batch aborted");
                return false;
            }
        }

        info!(count = numbers.len(), provider, "SMS batch sent");
        true
    }
}
