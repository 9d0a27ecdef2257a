use tracing::{info, warn};

use crate::domain::ports::{NetworkAuthorizer, Notifier};
use crate::domain::types::{normalize_email, validate_email};
use crate::error::OtpAuthError;
use crate::usecase::CredentialCore;

pub struct RequestOtpInput {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOtpOutput {
    pub validity_secs: u64,
}

impl<N, A> CredentialCore<N, A>
where
    N: Notifier,
    A: NetworkAuthorizer,
{
    /// Issue a fresh code for an address and hand it to the notifier.
    ///
    /// The code is recorded before delivery and stays Active if delivery fails; a retry
    /// issues a new code rather than resending this one.
    pub async fn request_otp(
        &self,
        input: RequestOtpInput,
    ) -> Result<RequestOtpOutput, OtpAuthError> {
        let address = normalize_email(&input.email);
        if !validate_email(&address) {
            return Err(OtpAuthError::InvalidAddress);
        }

        let now = self.now();
        self.sweep_otps(now);
        self.sweep_sessions(now);

        let code = self.otps.issue(&address, now)?;

        // Store lock is released; a stalled transport only delays this request.
        let delivered = self
            .bounded("notifier", self.notifier.deliver(&address, &code))
            .await;
        if !delivered && self.settings.notifier_enabled {
            warn!(email = %address, "otp delivery failed");
            return Err(OtpAuthError::DeliveryFailed);
        }

        info!(email = %address, "otp requested");
        Ok(RequestOtpOutput {
            validity_secs: self.settings.otp_validity_secs,
        })
    }
}
