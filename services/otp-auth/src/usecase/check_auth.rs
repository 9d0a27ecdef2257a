use crate::domain::ports::{NetworkAuthorizer, Notifier};
use crate::error::OtpAuthError;
use crate::usecase::CredentialCore;

pub struct CheckAuthInput {
    pub device_id: Option<String>,
    /// When present the live session must carry this token.
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckAuthOutput {
    pub authenticated: bool,
    pub address: Option<String>,
    pub expires_in_secs: Option<u64>,
}

impl CheckAuthOutput {
    fn unauthenticated() -> Self {
        Self {
            authenticated: false,
            address: None,
            expires_in_secs: None,
        }
    }
}

impl<N, A> CredentialCore<N, A>
where
    N: Notifier,
    A: NetworkAuthorizer,
{
    pub fn check_auth(&self, input: CheckAuthInput) -> Result<CheckAuthOutput, OtpAuthError> {
        let device_id = input
            .device_id
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty())
            .ok_or(OtpAuthError::MissingInput)?;

        let now = self.now();
        self.sweep_sessions(now);

        let Some(session) = self.sessions.live_session(&device_id, now) else {
            return Ok(CheckAuthOutput::unauthenticated());
        };
        if input
            .token
            .as_deref()
            .is_some_and(|token| token != session.token)
        {
            return Ok(CheckAuthOutput::unauthenticated());
        }

        Ok(CheckAuthOutput {
            authenticated: true,
            expires_in_secs: Some(session.remaining_secs(now)),
            address: Some(session.address),
        })
    }
}
