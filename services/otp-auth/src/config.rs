use std::time::Duration;

use anyhow::{Context as _, bail, ensure};
use clap::Parser;
use url::Url;

use crate::infra::notifier::SmtpSettings;
use crate::usecase::CoreSettings;

/// Longest validity or session accepted (one year).
const MAX_WINDOW_SECS: u64 = 365 * 24 * 3600;

/// Command line, every flag also readable from the environment.
#[derive(Debug, Parser)]
#[command(name = "otp-auth", version, about = "Email OTP authentication for captive portals")]
pub struct Args {
    /// TCP port to listen on
    #[arg(long, env = "OTP_AUTH_PORT", default_value_t = 5000)]
    pub port: u16,

    /// OTP length in decimal digits (4-12)
    #[arg(long, env = "OTP_LENGTH", default_value_t = 6)]
    pub otp_length: usize,

    /// OTP validity window in seconds
    #[arg(long, env = "OTP_VALIDITY_SECS", default_value_t = 300)]
    pub otp_validity_secs: u64,

    /// Session duration in seconds
    #[arg(long, env = "SESSION_DURATION_SECS", default_value_t = 3600)]
    pub session_duration_secs: u64,

    /// Send real email over SMTP; otherwise codes are only logged
    #[arg(long, env = "EMAIL_ENABLED", default_value_t = false, action = clap::ArgAction::Set)]
    pub email_enabled: bool,

    /// SMTP server host, reached with STARTTLS
    #[arg(long, env = "SMTP_SERVER")]
    pub smtp_server: Option<String>,

    #[arg(long, env = "SMTP_PORT", default_value_t = 587)]
    pub smtp_port: u16,

    #[arg(long, env = "SMTP_USERNAME")]
    pub smtp_username: Option<String>,

    #[arg(long, env = "SMTP_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<String>,

    /// Sender address, defaults to the SMTP username
    #[arg(long, env = "FROM_EMAIL")]
    pub from_email: Option<String>,

    /// Router CGI endpoint that grants network access
    #[arg(long, env = "ROUTER_AUTH_URL", default_value = "http://192.168.1.1/cgi-bin/auth")]
    pub router_auth_url: Url,

    /// Timeout in seconds for SMTP and router calls
    #[arg(long, env = "COLLABORATOR_TIMEOUT_SECS", default_value_t = 5)]
    pub collaborator_timeout_secs: u64,

    /// Background sweep period in seconds, 0 disables it
    #[arg(long, env = "SWEEP_INTERVAL_SECS", default_value_t = 60)]
    pub sweep_interval_secs: u64,
}

/// Mail delivery mode derived from the flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Simulated,
    Smtp(SmtpSettings),
}

/// Validated service configuration.
#[derive(Debug, Clone)]
pub struct OtpAuthConfig {
    pub port: u16,
    pub core: CoreSettings,
    pub delivery: Delivery,
    pub router_auth_url: Url,
    pub sweep_interval: Option<Duration>,
}

impl Args {
    pub fn into_config(self) -> anyhow::Result<OtpAuthConfig> {
        ensure!(
            (4..=12).contains(&self.otp_length),
            "otp length must be between 4 and 12 digits, got {}",
            self.otp_length
        );
        for (name, value) in [
            ("otp validity", self.otp_validity_secs),
            ("session duration", self.session_duration_secs),
        ] {
            ensure!(
                (1..=MAX_WINDOW_SECS).contains(&value),
                "{name} must be between 1 and {MAX_WINDOW_SECS} seconds, got {value}"
            );
        }
        ensure!(
            self.collaborator_timeout_secs > 0,
            "collaborator timeout must be positive"
        );

        let delivery = if self.email_enabled {
            let (Some(server), Some(username), Some(password)) =
                (self.smtp_server, self.smtp_username, self.smtp_password)
            else {
                bail!("EMAIL_ENABLED requires SMTP_SERVER, SMTP_USERNAME and SMTP_PASSWORD");
            };
            Delivery::Smtp(SmtpSettings {
                server,
                port: self.smtp_port,
                from: self.from_email.unwrap_or_else(|| username.clone()),
                username,
                password,
            })
        } else {
            Delivery::Simulated
        };

        Ok(OtpAuthConfig {
            port: self.port,
            core: CoreSettings {
                otp_length: self.otp_length,
                otp_validity_secs: self.otp_validity_secs,
                session_duration_secs: self.session_duration_secs,
                notifier_enabled: self.email_enabled,
                collaborator_timeout: Duration::from_secs(self.collaborator_timeout_secs),
            },
            delivery,
            router_auth_url: self.router_auth_url,
            sweep_interval: (self.sweep_interval_secs > 0)
                .then(|| Duration::from_secs(self.sweep_interval_secs)),
        })
    }
}

impl OtpAuthConfig {
    pub fn from_args() -> anyhow::Result<Self> {
        Args::parse().into_config().context("invalid configuration")
    }
}
