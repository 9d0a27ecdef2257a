use tracing::{debug, info, warn};

use crate::domain::ports::{NetworkAuthorizer, Notifier};
use crate::error::OtpAuthError;
use crate::usecase::CredentialCore;

pub struct VerifyOtpInput {
    pub code: Option<String>,
    pub device_id: Option<String>,
    /// Network address of the caller, forwarded to the router when known.
    pub caller_address: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VerifyOtpOutput {
    pub token: String,
    pub address: String,
    pub expires_in_secs: u64,
    /// Advisory: whether the router accepted the device. Never affects the session.
    pub router_granted: bool,
}

fn required(value: Option<String>) -> Result<String, OtpAuthError> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or(OtpAuthError::MissingInput)
}

impl<N, A> CredentialCore<N, A>
where
    N: Notifier,
    A: NetworkAuthorizer,
{
    /// Claim a code for a device, open its session, then ask the router to let it in.
    pub async fn verify_otp(&self, input: VerifyOtpInput) -> Result<VerifyOtpOutput, OtpAuthError> {
        let now = self.now();
        self.sweep_sessions(now);

        let code = required(input.code)?;
        let device_id = required(input.device_id)?;

        // Entropy failure must surface before the code is spent.
        let token = self.sessions.draw_token()?;

        // Claim before sweeping OTPs: an expired but still tracked code reports Expired
        // rather than vanishing into InvalidCode.
        let claim = self.otps.mark_used(&code, &device_id, now);
        self.sweep_otps(now);
        let otp = claim.inspect_err(|e| {
            debug!(device_id = %device_id, kind = e.kind(), "otp verification rejected");
        })?;

        let session = self
            .sessions
            .insert(&device_id, &otp.address, &otp.code, token, now);
        info!(device_id = %device_id, email = %otp.address, "device authenticated");

        let router_granted = self
            .bounded(
                "network_authorizer",
                self.authorizer
                    .grant(&device_id, input.caller_address.as_deref()),
            )
            .await;
        if !router_granted {
            warn!(
                device_id = %device_id,
                "router authorization failed, session kept"
            );
        }

        Ok(VerifyOtpOutput {
            token: session.token,
            address: session.address,
            expires_in_secs: self.settings.session_duration_secs,
            router_granted,
        })
    }
}
